//! Unified error model for the failures that abort a whole run.
//!
//! Per-unit failures are never errors: they travel back as result entries.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatrunError {
    #[error("PERSIST/IO: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PERSIST/SERIALIZE: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("PERSIST/KEY: dataset id {0:?} cannot be used as a folder name")]
    InvalidKey(String),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("REQUEST/{0}")]
    Request(String),

    #[error("RUNTIME/{0}")]
    Runtime(String),
}

impl StatrunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
