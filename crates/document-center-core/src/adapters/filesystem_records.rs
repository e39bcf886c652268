//! # Filesystem Record Store
//!
//! Stores each webhook record as a JSON file under a date-partitioned
//! directory tree.

use crate::records::*;
use crate::{RecordId, Timestamp};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Filesystem-based record store
///
/// Layout: `{base}/webhook-records/year={Y}/month={M}/day={D}/{id}.json`.
///
/// # Examples
///
/// ```no_run
/// use document_center_core::adapters::FilesystemRecordStore;
/// use std::path::PathBuf;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemRecordStore::new(PathBuf::from("./data/records")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemRecordStore {
    base_path: PathBuf,
}

impl FilesystemRecordStore {
    /// Create new filesystem record store
    ///
    /// # Errors
    ///
    /// Returns error if base path cannot be created or accessed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to create base directory: {}", e),
            })?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self, record: &WebhookRecord) -> PathBuf {
        self.base_path.join(record.storage_path())
    }

    /// Locate a stored record file by ID
    ///
    /// The partition comes from `received_at`, which the ID alone does not
    /// carry, so partitions are scanned.
    async fn find_record_file(&self, record_id: &RecordId) -> Result<Option<PathBuf>, StoreError> {
        let root = self.base_path.join("webhook-records");
        if !fs::try_exists(&root).await.unwrap_or(false) {
            return Ok(None);
        }

        let file_name = format!("{}.json", record_id);
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir).await.map_err(|e| StoreError::Io {
                message: format!("Failed to read directory: {}", e),
            })?;

            while let Some(entry) = read_dir.next_entry().await.map_err(|e| StoreError::Io {
                message: format!("Failed to read directory entry: {}", e),
            })? {
                let path = entry.path();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .map_err(|e| StoreError::Io {
                        message: format!("Failed to read directory entry type: {}", e),
                    })?;
                if is_dir {
                    pending.push(path);
                } else if entry.file_name().to_string_lossy() == file_name {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl WebhookRecordStore for FilesystemRecordStore {
    async fn store_record(&self, record: &WebhookRecord) -> Result<RecordReceipt, StoreError> {
        let record_path = self.record_path(record);

        if fs::try_exists(&record_path).await.unwrap_or(false) {
            return Err(StoreError::AlreadyExists {
                record_id: record.id,
            });
        }

        if let Some(parent) = record_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io {
                    message: format!("Failed to create directory structure: {}", e),
                })?;
        }

        let json = serde_json::to_string_pretty(record).map_err(|e| {
            StoreError::SerializationFailed {
                message: format!("Failed to serialize record: {}", e),
            }
        })?;

        // Write to temporary file first, then rename into place
        let temp_path = record_path.with_extension("tmp");
        write_then_rename(&temp_path, &record_path, json.as_bytes()).await?;

        Ok(RecordReceipt {
            record_id: record.id,
            storage_path: record.storage_path(),
            size_bytes: json.len() as u64,
            stored_at: Timestamp::now(),
        })
    }

    async fn get_record(&self, record_id: &RecordId) -> Result<Option<WebhookRecord>, StoreError> {
        let Some(path) = self.find_record_file(record_id).await? else {
            return Ok(None);
        };

        let json = fs::read_to_string(&path).await.map_err(|e| StoreError::Io {
            message: format!("Failed to read record: {}", e),
        })?;

        let record = serde_json::from_str(&json).map_err(|e| StoreError::SerializationFailed {
            message: format!("Failed to deserialize record: {}", e),
        })?;

        Ok(Some(record))
    }
}

/// Write `contents` to `temp_path` and rename it to `final_path`
///
/// The temp file is removed if any step fails.
async fn write_then_rename(
    temp_path: &Path,
    final_path: &Path,
    contents: &[u8],
) -> Result<(), StoreError> {
    let result = async {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to create temp file: {}", e),
            })?;

        file.write_all(contents)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to write record: {}", e),
            })?;

        file.flush().await.map_err(|e| StoreError::Io {
            message: format!("Failed to flush file: {}", e),
        })?;
        drop(file);

        fs::rename(temp_path, final_path)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to rename temp file: {}", e),
            })
    }
    .await;

    if result.is_err() {
        if let Err(e) = fs::remove_file(temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "Failed to remove temporary record file"
                );
            }
        }
    }

    result
}

#[cfg(test)]
#[path = "filesystem_records_tests.rs"]
mod tests;
