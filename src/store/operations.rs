//! Operation history and its file persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculator::OperationKind;

use super::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// An operation about to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub user_id: UserId,
    pub kind: OperationKind,
    pub inputs: Vec<f64>,
    pub result: f64,
}

/// A recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: u64,
    pub inputs: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub result: f64,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Append-only operation history.
#[async_trait]
pub trait OperationStore: Send + Sync {
    async fn record(&self, op: NewOperation) -> Result<OperationRecord, StoreError>;

    /// All operations recorded for `user`, oldest first.
    async fn history(&self, user: UserId) -> Result<Vec<OperationRecord>, StoreError>;
}

/// A thread-safe in-memory history, optionally backed by a JSON file.
#[derive(Clone)]
pub struct MemoryOperationStore {
    inner: Arc<DashMap<UserId, Vec<OperationRecord>>>,
    next_id: Arc<AtomicU64>,
    persistence_path: Option<PathBuf>,
}

impl MemoryOperationStore {
    /// Create an empty store; `persistence_path` is where saves go.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            persistence_path,
        }
    }

    /// Load from `path` if it exists; later saves go to the same file.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<OperationRecord> = serde_json::from_reader(reader)?;

            let count = records.len();
            let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
            store.next_id.store(max_id + 1, Ordering::SeqCst);
            for record in records {
                store.inner.entry(record.user_id).or_default().push(record);
            }
            for mut entry in store.inner.iter_mut() {
                entry.value_mut().sort_by_key(|r| r.id);
            }
            tracing::info!(operations = count, path = %path.display(), "Loaded operation history");
        }
        Ok(store)
    }

    /// Write the whole history to the configured file. No-op without one.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut records: Vec<OperationRecord> = self
            .inner
            .iter()
            .flat_map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.id);

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &records)?;
        tracing::info!(operations = records.len(), path = %path.display(), "Saved operation history");
        Ok(())
    }

}

impl Default for MemoryOperationStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl OperationStore for MemoryOperationStore {
    async fn record(&self, op: NewOperation) -> Result<OperationRecord, StoreError> {
        let record = OperationRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            inputs: op.inputs,
            kind: op.kind,
            result: op.result,
            user_id: op.user_id,
            created_at: Utc::now(),
        };
        self.inner
            .entry(record.user_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn history(&self, user: UserId) -> Result<Vec<OperationRecord>, StoreError> {
        Ok(self
            .inner
            .get(&user)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }
}
