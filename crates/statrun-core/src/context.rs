//! Run context: identity of one `handle()` call, used for tracing.
use crate::record::Record;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    /// `<dataset_id>_v<dataset_version>`
    pub dataset_key: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn for_record(record: &Record) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            dataset_key: dataset_key(record),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

/// Folder key of a record in the results cache.
pub fn dataset_key(record: &Record) -> String {
    format!("{}_v{}", record.dataset_id, record.dataset_version)
}
