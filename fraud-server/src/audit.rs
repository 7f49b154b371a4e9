//! Audit log - a JSON array file holding every prediction
//!
//! Appends are serialized by one async mutex: read the array, push, write
//! a temp file, rename over the original.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::files::write_json_atomic;
use crate::models::AuditEntry;

pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry; returns the new entry count
    pub async fn append(&self, entry: &AuditEntry) -> anyhow::Result<usize> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await;
        entries.push(serde_json::to_value(entry)?);
        write_json_atomic(&self.path, &entries).await?;
        Ok(entries.len())
    }

    /// Current entries (missing or corrupt file → empty)
    pub async fn entries(&self) -> Vec<Value> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }

    async fn read_entries(&self) -> Vec<Value> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Audit log {} unreadable ({}), starting fresh", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                tracing::warn!("Audit log {} is not a JSON array, starting fresh", self.path.display());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Audit log {} is corrupt ({}), starting fresh", self.path.display(), e);
                Vec::new()
            }
        }
    }
}
