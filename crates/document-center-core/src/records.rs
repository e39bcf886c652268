//! # Webhook Record Persistence
//!
//! Append-only storage of received webhook payloads.
//!
//! Payload keys are checked against a validated key-set before anything is
//! written: keys must be short identifiers, values are bounded in size, and
//! the number of fields per record is capped. Fields failing these checks are
//! dropped and counted on the record.

use crate::payload::WebhookPayload;
use crate::{RecordId, Timestamp};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum number of fields kept per record
pub const MAX_RECORD_FIELDS: usize = 64;

/// Maximum length in bytes of a stored field value
pub const MAX_FIELD_VALUE_BYTES: usize = 8 * 1024;

static FIELD_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,64}$").expect("field key pattern is valid"));

/// Check whether `key` may be stored as a record field
pub fn is_valid_field_key(key: &str) -> bool {
    FIELD_KEY_PATTERN.is_match(key)
}

/// Persisted representation of one received webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRecord {
    pub id: RecordId,
    pub received_at: Timestamp,
    pub fields: BTreeMap<String, String>,
    /// Number of payload fields dropped by key-set validation
    pub rejected_fields: usize,
}

impl WebhookRecord {
    /// Build a record from a payload, applying key-set validation
    pub fn from_payload(payload: &WebhookPayload) -> Self {
        let mut fields = BTreeMap::new();
        let mut rejected_fields = 0;

        for (key, value) in payload.iter() {
            let acceptable = is_valid_field_key(key)
                && value.len() <= MAX_FIELD_VALUE_BYTES
                && fields.len() < MAX_RECORD_FIELDS;

            if acceptable {
                fields.insert(key.to_string(), value.to_string());
            } else {
                rejected_fields += 1;
            }
        }

        Self {
            id: RecordId::new(),
            received_at: Timestamp::now(),
            fields,
            rejected_fields,
        }
    }

    /// Relative storage path: `webhook-records/year=/month=/day=/{id}.json`
    pub fn storage_path(&self) -> String {
        format!(
            "webhook-records/year={:04}/month={:02}/day={:02}/{}.json",
            self.received_at.year(),
            self.received_at.month(),
            self.received_at.day(),
            self.id
        )
    }
}

/// Receipt for a stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    pub record_id: RecordId,
    pub storage_path: String,
    pub size_bytes: u64,
    pub stored_at: Timestamp,
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record {record_id} already exists")]
    AlreadyExists { record_id: RecordId },

    #[error("Failed to serialize record: {message}")]
    SerializationFailed { message: String },

    #[error("Storage I/O failed: {message}")]
    Io { message: String },
}

/// Interface for webhook record persistence
///
/// Records are create-only: there is no update or delete.
#[async_trait]
pub trait WebhookRecordStore: Send + Sync {
    /// Persist a new record
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if a record with the same ID was
    /// stored before, or an I/O or serialization error from the backend.
    async fn store_record(&self, record: &WebhookRecord) -> Result<RecordReceipt, StoreError>;

    /// Read a record back by ID, `None` if it was never stored
    async fn get_record(&self, record_id: &RecordId) -> Result<Option<WebhookRecord>, StoreError>;
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
