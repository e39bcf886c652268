//! # In-Memory Record Store
//!
//! Record store for tests and local runs without a data directory.

use crate::records::*;
use crate::{RecordId, Timestamp};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Record store keeping everything in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordId, WebhookRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored records
    pub fn records(&self) -> Vec<WebhookRecord> {
        self.records
            .read()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WebhookRecordStore for InMemoryRecordStore {
    async fn store_record(&self, record: &WebhookRecord) -> Result<RecordReceipt, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Io {
            message: "record store lock poisoned".to_string(),
        })?;

        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists {
                record_id: record.id,
            });
        }

        let size_bytes = serde_json::to_vec(record)
            .map_err(|e| StoreError::SerializationFailed {
                message: e.to_string(),
            })?
            .len() as u64;

        records.insert(record.id, record.clone());

        Ok(RecordReceipt {
            record_id: record.id,
            storage_path: record.storage_path(),
            size_bytes,
            stored_at: Timestamp::now(),
        })
    }

    async fn get_record(&self, record_id: &RecordId) -> Result<Option<WebhookRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Io {
            message: "record store lock poisoned".to_string(),
        })?;
        Ok(records.get(record_id).cloned())
    }
}
