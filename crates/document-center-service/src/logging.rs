//! Tracing subscriber set-up.
//!
//! Console output is plain text or JSON. When `logging.webhook_log_file` is
//! set, events under the `webhook` target are also appended to that file.

use document_center_api::LoggingConfig;
use document_center_core::WEBHOOK_LOG_TARGET;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open webhook log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tracing subscriber: {message}")]
    Init { message: String },
}

/// Filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},tower_http=debug", config.level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let console_plain = (!config.json_format).then(fmt::layer);
    let console_json = config.json_format.then(|| fmt::layer().json());

    let webhook_file = match &config.webhook_log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(webhook_target_filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(console_plain)
        .with(console_json)
        .with(webhook_file)
        .try_init()
        .map_err(|e| LoggingError::Init {
            message: e.to_string(),
        })
}

/// Only events logged under the webhook target
pub fn webhook_target_filter() -> Targets {
    Targets::new().with_target(WEBHOOK_LOG_TARGET, Level::TRACE)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
