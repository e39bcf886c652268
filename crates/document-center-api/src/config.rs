//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use document_center_core::auth::WebhookToken;
use document_center_core::download::DownloadSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration
///
/// Every section and field carries a serde default, so a partial (or empty)
/// configuration source still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// Authorization settings
    pub security: SecurityConfig,

    /// Filesystem locations
    pub storage: StorageConfig,

    /// Outbound file download settings
    pub download: DownloadConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check cross-field constraints the types cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.webhooks.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhooks.endpoint_path must start with '/', got '{}'",
                    self.webhooks.endpoint_path
                ),
            });
        }

        if self.security.require_auth && self.security.webhook_token().is_none() {
            return Err(ConfigError::Missing {
                key: "security.webhook_token".to_string(),
            });
        }

        if self.storage.client_folders_base_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                key: "storage.client_folders_base_path".to_string(),
            });
        }

        if self.storage.records_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                key: "storage.records_path".to_string(),
            });
        }

        if self.download.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "download.timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.download.connect_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "download.connect_timeout_seconds must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Use `token` as the webhook secret unless one is already configured
    pub fn with_token_fallback(mut self, token: Option<String>) -> Self {
        if self.security.webhook_token().is_none() {
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                self.security.webhook_token = Some(token);
            }
        }
        self
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
        }
    }
}

/// Authorization configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared secret expected in `Authorization: Bearer <token>`
    pub webhook_token: Option<String>,

    /// Reject unauthorized requests with 401
    ///
    /// When false, authorization failures are logged and the request is
    /// processed anyway.
    pub require_auth: bool,
}

impl SecurityConfig {
    /// The configured token, `None` if unset or empty
    pub fn webhook_token(&self) -> Option<WebhookToken> {
        self.webhook_token.clone().and_then(WebhookToken::new)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            webhook_token: None,
            require_auth: true,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one sub-folder per client
    pub client_folders_base_path: PathBuf,

    /// Directory for persisted webhook records
    pub records_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            client_folders_base_path: PathBuf::from("/srv/document-center/clients"),
            records_path: PathBuf::from("data"),
        }
    }
}

/// Outbound download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Verify the download source's TLS certificate
    ///
    /// Security relevant: only disable for sources with self-signed
    /// certificates on a trusted network.
    pub verify_tls: bool,

    /// Total request timeout in seconds
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    pub connect_timeout_seconds: u64,
}

impl DownloadConfig {
    pub fn settings(&self) -> DownloadSettings {
        DownloadSettings {
            verify_tls: self.verify_tls,
            timeout: Duration::from_secs(self.timeout_seconds),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,

    /// Append-only file receiving the `webhook` log target (optional)
    pub webhook_log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            webhook_log_file: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
