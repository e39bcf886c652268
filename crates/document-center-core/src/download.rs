//! # File Downloader
//!
//! Streams an HTTP GET response body to a local file.
//!
//! The body is read chunk by chunk and written through a small buffer to a
//! `.part` sibling of the destination, which is renamed over the destination
//! once the transfer completes. Each download gets its own `.part` file, so
//! concurrent downloads to one destination never share a file and the last
//! rename wins. On any failure the `.part` file is removed and whatever was
//! previously at the destination stays as it was.

use crate::{Ulid, WEBHOOK_LOG_TARGET};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

/// Write buffer size for streamed downloads
pub const WRITE_CHUNK_SIZE: usize = 1024;

/// Suffix of the in-progress file next to the destination
pub const PARTIAL_SUFFIX: &str = ".part";

/// Errors raised while downloading a file
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Download failed with HTTP status {status}")]
    DownloadFailed { status: u16 },

    #[error("Download timed out: {message}")]
    Timeout { message: String },

    #[error("Download transport error: {message}")]
    Transport { message: String },

    #[error("Failed to write file {path}: {message}")]
    FileWriteError { path: PathBuf, message: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientSetup { message: String },
}

impl DownloadError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::DownloadFailed {
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                message: error.to_string(),
            }
        }
    }

    fn write_error(path: &Path, error: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// Interface for fetching a remote file into a local path
#[async_trait]
pub trait FileDownloader: Send + Sync {
    /// Download `url` into `destination`, overwriting any existing file
    ///
    /// Returns the number of bytes written.
    async fn download(&self, url: &Url, destination: &Path) -> Result<u64, DownloadError>;
}

/// HTTP client settings for downloads
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Verify the source's TLS certificate
    ///
    /// Security relevant: disabling this accepts any certificate, including
    /// self-signed and expired ones.
    pub verify_tls: bool,

    /// Overall request timeout, covering connection and body read
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// [`FileDownloader`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFileDownloader {
    client: reqwest::Client,
}

impl HttpFileDownloader {
    /// Build the downloader and its HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientSetup`] if the TLS backend cannot be
    /// initialised.
    pub fn new(settings: &DownloadSettings) -> Result<Self, DownloadError> {
        if !settings.verify_tls {
            warn!(
                target: WEBHOOK_LOG_TARGET,
                "TLS certificate verification is DISABLED for file downloads"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| DownloadError::ClientSetup {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    async fn stream_to_file(
        &self,
        mut response: reqwest::Response,
        partial_path: &Path,
    ) -> Result<u64, DownloadError> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(partial_path)
            .await
            .map_err(|e| DownloadError::write_error(partial_path, e))?;
        let mut writer = BufWriter::with_capacity(WRITE_CHUNK_SIZE, file);
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(DownloadError::from_reqwest)? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::write_error(partial_path, e))?;
            written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::write_error(partial_path, e))?;

        Ok(written)
    }
}

#[async_trait]
impl FileDownloader for HttpFileDownloader {
    #[instrument(skip(self), fields(url = %url, destination = %destination.display()))]
    async fn download(&self, url: &Url, destination: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(DownloadError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let partial_path = partial_path_for(destination, Ulid::new());
        let written = match self.stream_to_file(response, &partial_path).await {
            Ok(written) => written,
            Err(e) => {
                remove_partial(&partial_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&partial_path, destination).await {
            remove_partial(&partial_path).await;
            return Err(DownloadError::write_error(destination, e));
        }

        debug!(
            target: WEBHOOK_LOG_TARGET,
            bytes = written,
            "Download complete"
        );
        Ok(written)
    }
}

/// Path of the in-progress file for one download to `destination`
///
/// `<name>.<id>.part` in the destination's directory.
pub fn partial_path_for(destination: &Path, id: Ulid) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!(".{id}"));
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

async fn remove_partial(partial_path: &Path) {
    match fs::remove_file(partial_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            target: WEBHOOK_LOG_TARGET,
            path = %partial_path.display(),
            error = %e,
            "Failed to remove partial download"
        ),
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
