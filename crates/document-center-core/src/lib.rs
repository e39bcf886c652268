//! # Document Center Core
//!
//! Domain logic for the document center webhook receiver.
//!
//! A document-delivery notification names a file URL plus the business fields
//! (client tax ID, month/year, department) that decide where the file lives on
//! the shared client folder tree. This crate turns such a notification into a
//! persisted record and a downloaded file in the right folder.
//!
//! ## Architecture
//!
//! - Pure helpers: [`sanitize`], [`filename`]
//! - Filesystem discovery: [`locator`], [`destination`]
//! - External collaborators behind traits: [`download::FileDownloader`],
//!   [`records::WebhookRecordStore`]
//! - Orchestration: [`processor::DocumentProcessor`]
//!
//! ## Usage
//!
//! ```rust
//! use document_center_core::sanitize::sanitize_segment;
//!
//! assert_eq!(sanitize_segment("12.345.678/0001-99"), "12.345.678_0001-99");
//! ```

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod adapters;
pub mod auth;
pub mod destination;
pub mod download;
pub mod filename;
pub mod locator;
pub mod payload;
pub mod processor;
pub mod records;
pub mod sanitize;

pub use ulid::Ulid;

/// Tracing target for webhook diagnostics.
///
/// Every step of the webhook flow logs under this target so that operators
/// can route it to a dedicated sink.
pub const WEBHOOK_LOG_TARGET: &str = "webhook";

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Unique identifier for a persisted webhook record
///
/// Uses ULID for lexicographic sorting and global uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Ulid);

impl RecordId {
    /// Generate a new unique record ID
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get string representation of record ID
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = s.parse::<Ulid>().map_err(|_| ParseError::InvalidFormat {
            expected: "ULID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(ulid))
    }
}

/// UTC timestamp with RFC3339 serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get year component
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Get month component (1-12)
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Get day component (1-31)
    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
