//! Run persistence: timestamped JSON snapshots of handled records.
//!
//! Layout: `<root>/<dataset_id>_v<dataset_version>/results_<YYYYMMDD_HHMMSS>.json`.
//! The cache is append-only; nothing here deletes or overwrites a snapshot.
use crate::context::dataset_key;
use crate::error::StatrunError;
use crate::record::Record;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Where a snapshot landed.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRun {
    /// Results folder; chart images are written here too
    pub folder: PathBuf,
    pub snapshot: PathBuf,
    /// `blake3:<hex>` of the written bytes
    pub digest: String,
    pub saved_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_for(&self, record: &Record) -> PathBuf {
        self.root.join(dataset_key(record))
    }

    /// Serialize `record` into a new snapshot file. Any failure here is
    /// returned: a run that cannot be recorded has no audit trail.
    pub fn save(&self, record: &Record) -> Result<SavedRun, StatrunError> {
        check_key(&record.dataset_id)?;
        let bytes = encode(record)?;

        let folder = self.folder_for(record);
        std::fs::create_dir_all(&folder).map_err(|e| StatrunError::io(&folder, e))?;

        let saved_at = Local::now();
        let stamp = saved_at.format("%Y%m%d_%H%M%S").to_string();
        let snapshot = write_new(&folder, &stamp, &bytes)?;

        Ok(SavedRun {
            folder,
            snapshot,
            digest: format!("blake3:{}", blake3::hash(&bytes)),
            saved_at,
        })
    }

    /// Snapshots for a record's dataset/version, oldest first.
    pub fn history(&self, record: &Record) -> Result<Vec<PathBuf>, StatrunError> {
        let folder = self.folder_for(record);
        let entries = match std::fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StatrunError::io(&folder, e)),
        };
        let mut snapshots = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StatrunError::io(&folder, e))?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("results_") && n.ends_with(".json"));
            if is_snapshot {
                snapshots.push(path);
            }
        }
        snapshots.sort_by_cached_key(|path| snapshot_order(path));
        Ok(snapshots)
    }

    /// Load a snapshot back into a record, e.g. to replay it.
    pub fn load(&self, snapshot: impl AsRef<Path>) -> Result<Record, StatrunError> {
        let snapshot = snapshot.as_ref();
        let text = std::fs::read_to_string(snapshot).map_err(|e| StatrunError::io(snapshot, e))?;
        Record::from_json(&text)
    }
}

fn check_key(dataset_id: &str) -> Result<(), StatrunError> {
    let bad = dataset_id.is_empty()
        || dataset_id == "."
        || dataset_id == ".."
        || dataset_id.contains(['/', '\\']);
    if bad {
        return Err(StatrunError::InvalidKey(dataset_id.to_string()));
    }
    Ok(())
}

/// `(stamp, n)` of `results_<stamp>[_<n>].json`, so `_10` sorts after `_2`.
fn snapshot_order(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("results_"))
        .unwrap_or_default();
    // the stamp itself is `%Y%m%d_%H%M%S`
    match stem.match_indices('_').nth(1) {
        Some((at, _)) => match stem[at + 1..].parse() {
            Ok(n) => (stem[..at].to_string(), n),
            Err(_) => (stem.to_string(), 0),
        },
        None => (stem.to_string(), 0),
    }
}

fn encode(record: &Record) -> Result<Vec<u8>, StatrunError> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    record.serialize(&mut serializer)?;
    Ok(bytes)
}

/// Create `results_<stamp>.json`, or `results_<stamp>_<n>.json` when runs
/// land in the same second.
fn write_new(folder: &Path, stamp: &str, bytes: &[u8]) -> Result<PathBuf, StatrunError> {
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("results_{}.json", stamp),
            n => format!("results_{}_{}.json", stamp, n),
        };
        let path = folder.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes).map_err(|e| StatrunError::io(&path, e))?;
                file.sync_all().map_err(|e| StatrunError::io(&path, e))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(StatrunError::io(&path, e)),
        }
    }
}
