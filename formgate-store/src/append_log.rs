//! Per-form JSON append log.
//!
//! Each form gets one file `<out_dir>/<form>.json` shaped
//! `{"data":[{...}, ...]}` — a top-level object with a single array field,
//! one object per submission in arrival order. Appending is a full-file
//! read-modify-write, not a true log; a per-form lock serializes writers so
//! concurrent submissions to the same form cannot drop a record.

use dashmap::DashMap;
use formgate_core::GateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::debug;

/// Field injected into every persisted record: unix seconds, as a string.
pub const TIMESTAMP_FIELD: &str = "__ts";

/// On-disk shape of a per-form log file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    #[serde(default)]
    data: Vec<HashMap<String, String>>,
}

/// Append-only store of form submissions, one JSON file per form name.
pub struct AppendLog {
    out_dir: PathBuf,
    /// Per-form write locks. Entries are created on first use and never
    /// removed; the set of form names is bounded by the template registry.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AppendLog {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            locks: DashMap::new(),
        }
    }

    /// Append one submission to the form's log file.
    ///
    /// A missing file is treated as an empty log. The record written is the
    /// submitted values plus [`TIMESTAMP_FIELD`]. Fails with
    /// `PersistenceRead` if an existing file holds invalid JSON, or
    /// `PersistenceWrite` if the rewrite fails.
    pub async fn append(
        &self,
        form: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), GateError> {
        let lock = self.lock_for(form);
        let _guard = lock.lock().await;

        let path = self.file_path(form);
        let mut log = read_log(&path)?;

        let mut record = values.clone();
        record.insert(TIMESTAMP_FIELD.to_string(), unix_now().to_string());
        log.data.push(record);

        let json = serde_json::to_vec(&log)?;
        std::fs::write(&path, json).map_err(|e| GateError::PersistenceWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(form = %form, path = %path.display(), records = log.data.len(), "submission appended");
        Ok(())
    }

    fn file_path(&self, form: &str) -> PathBuf {
        let stem = form.trim_start_matches('/');
        self.out_dir.join(format!("{stem}.json"))
    }

    fn lock_for(&self, form: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(form.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn read_log(path: &Path) -> Result<LogFile, GateError> {
    if !path.exists() {
        return Ok(LogFile::default());
    }
    let data = std::fs::read_to_string(path).map_err(|e| GateError::PersistenceRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&data).map_err(|e| GateError::PersistenceRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
