//! # Document Processor
//!
//! Orchestrates one webhook after it has passed authorization:
//!
//! 1. persist the payload as a [`WebhookRecord`]
//! 2. if a file URL is present, resolve the destination folder, generate the
//!    filename and download the file into place
//! 3. log the received webhook
//!
//! Persistence and file delivery are separate failure domains: a failure in
//! one is logged and reported but never stops the other. Nothing here panics
//! or returns early on bad input; the outcome of each step is collected into
//! a [`ProcessingReport`].

use crate::destination::{DestinationResolver, ResolveError};
use crate::download::{DownloadError, FileDownloader};
use crate::filename::generate_file_name;
use crate::payload::{fields, WebhookPayload};
use crate::records::{RecordReceipt, StoreError, WebhookRecord, WebhookRecordStore};
use crate::{RecordId, WEBHOOK_LOG_TARGET};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Errors on the file-processing path
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Required field '{field}' is missing from the payload")]
    MissingField { field: &'static str },

    #[error("Invalid file URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl DeliveryError {
    /// Stable error kind name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "MissingField",
            Self::InvalidUrl { .. } => "InvalidUrl",
            Self::Resolve(e) => match e {
                ResolveError::MissingField { .. } => "MissingField",
                ResolveError::InvalidDateFormat { .. } => "InvalidDateFormat",
                ResolveError::InvalidMonth { .. } => "InvalidMonth",
                ResolveError::InvalidSegment { .. } => "InvalidSegment",
                ResolveError::ClientFolderNotFound { .. } => "ClientFolderNotFound",
                ResolveError::DestinationNotFound { .. } => "DestinationNotFound",
            },
            Self::Download(e) => match e {
                DownloadError::DownloadFailed { .. } => "DownloadFailed",
                DownloadError::Timeout { .. } => "Timeout",
                DownloadError::Transport { .. } => "DownloadFailed",
                DownloadError::FileWriteError { .. } => "FileWriteError",
                DownloadError::ClientSetup { .. } => "DownloadFailed",
            },
        }
    }
}

/// What happened to the referenced file
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was downloaded to `path`
    Stored { path: PathBuf, bytes: u64 },
    /// The payload carried no file URL
    Skipped,
    /// Delivery failed; nothing was written at the destination
    Failed(DeliveryError),
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of processing one webhook
#[derive(Debug)]
pub struct ProcessingReport {
    pub record_id: RecordId,
    pub persistence: Result<RecordReceipt, StoreError>,
    pub file: FileOutcome,
}

impl ProcessingReport {
    /// True when the record was stored and the file was stored or skipped
    pub fn is_success(&self) -> bool {
        self.persistence.is_ok() && !self.file.is_failure()
    }
}

/// Interface for handling an authorized webhook payload
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Run every processing step and report their outcomes
    ///
    /// Never fails as a whole; per-step failures are in the report.
    async fn process(&self, payload: WebhookPayload) -> ProcessingReport;
}

/// Default [`DocumentProcessor`]: record store + resolver + downloader
pub struct DocumentCenterProcessor {
    resolver: DestinationResolver,
    store: Arc<dyn WebhookRecordStore>,
    downloader: Arc<dyn FileDownloader>,
}

impl DocumentCenterProcessor {
    pub fn new(
        resolver: DestinationResolver,
        store: Arc<dyn WebhookRecordStore>,
        downloader: Arc<dyn FileDownloader>,
    ) -> Self {
        Self {
            resolver,
            store,
            downloader,
        }
    }

    /// Persist the payload
    async fn persist(&self, record: &WebhookRecord) -> Result<RecordReceipt, StoreError> {
        let result = self.store.store_record(record).await;
        match &result {
            Ok(receipt) => info!(
                target: WEBHOOK_LOG_TARGET,
                record_id = %receipt.record_id,
                storage_path = %receipt.storage_path,
                rejected_fields = record.rejected_fields,
                "Webhook data saved"
            ),
            Err(e) => error!(
                target: WEBHOOK_LOG_TARGET,
                record_id = %record.id,
                error = %e,
                "Failed to save webhook data"
            ),
        }
        result
    }

    /// Resolve, name and download the referenced file
    ///
    /// Returns the written path and size.
    pub async fn deliver_file(
        &self,
        payload: &WebhookPayload,
        file_url: &str,
    ) -> Result<(PathBuf, u64), DeliveryError> {
        let url = parse_file_url(file_url)?;
        let destination = self.resolver.resolve(payload).await?;
        let file_name = generate_file_name(payload, &url);
        let path = destination.file_path(&file_name);

        let bytes = self.downloader.download(&url, &path).await?;
        Ok((path, bytes))
    }
}

#[async_trait]
impl DocumentProcessor for DocumentCenterProcessor {
    #[instrument(skip(self, payload), fields(record_id))]
    async fn process(&self, payload: WebhookPayload) -> ProcessingReport {
        let record = WebhookRecord::from_payload(&payload);
        tracing::Span::current().record("record_id", tracing::field::display(&record.id));

        let persistence = self.persist(&record).await;

        let file = match require_file_url(&payload) {
            Err(e) => {
                warn!(
                    target: WEBHOOK_LOG_TARGET,
                    record_id = %record.id,
                    error_kind = e.kind(),
                    "File URL not found in payload"
                );
                FileOutcome::Skipped
            }
            Ok(file_url) => match self.deliver_file(&payload, file_url).await {
                Ok((path, bytes)) => {
                    info!(
                        target: WEBHOOK_LOG_TARGET,
                        record_id = %record.id,
                        path = %path.display(),
                        bytes,
                        "File saved"
                    );
                    FileOutcome::Stored { path, bytes }
                }
                Err(e) => {
                    error!(
                        target: WEBHOOK_LOG_TARGET,
                        record_id = %record.id,
                        error = %e,
                        error_kind = e.kind(),
                        file_url = %file_url,
                        "Failed to process file"
                    );
                    FileOutcome::Failed(e)
                }
            },
        };

        info!(
            target: WEBHOOK_LOG_TARGET,
            record_id = %record.id,
            payload = %serde_json::to_string(&payload).unwrap_or_default(),
            "Webhook received"
        );

        ProcessingReport {
            record_id: record.id,
            persistence,
            file,
        }
    }
}

/// Parse the payload's file URL, accepting only `http` and `https`
pub fn parse_file_url(file_url: &str) -> Result<Url, DeliveryError> {
    let url = Url::parse(file_url.trim()).map_err(|e| DeliveryError::InvalidUrl {
        url: file_url.to_string(),
        message: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DeliveryError::InvalidUrl {
            url: file_url.to_string(),
            message: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// The payload's file URL, or `MissingField` when absent or blank
pub fn require_file_url(payload: &WebhookPayload) -> Result<&str, DeliveryError> {
    payload.file_url().ok_or(DeliveryError::MissingField {
        field: fields::FILE_URL,
    })
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
