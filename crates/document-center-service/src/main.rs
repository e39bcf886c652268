//! # Document Center Service
//!
//! Binary entry point for the document center webhook receiver.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Wires the record store, destination resolver and file downloader
//! - Starts the HTTP server from document-center-api

mod logging;
mod settings;

use document_center_api::{start_server, ServiceConfig};
use document_center_core::{
    adapters::FilesystemRecordStore, destination::DestinationResolver,
    download::HttpFileDownloader, processor::DocumentCenterProcessor,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Exit code for configuration and start-up wiring failures
const CONFIG_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() {
    // Logging depends on configuration, so failures before this point go
    // to stderr.
    let explicit_path = std::env::var(settings::CONFIG_FILE_ENV).ok();
    let service_config = match settings::load_service_config(explicit_path.as_deref()) {
        Ok(config) => config.with_token_fallback(std::env::var(settings::TOKEN_FALLBACK_ENV).ok()),
        Err(e) => {
            eprintln!("Failed to load service configuration; aborting: {e}");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    if let Err(e) = logging::init_tracing(&service_config.logging) {
        eprintln!("Failed to initialize logging; aborting: {e}");
        std::process::exit(CONFIG_EXIT_CODE);
    }

    info!("Starting Document Center Service");

    if let Some(path) = explicit_path.as_deref().filter(|p| !p.is_empty()) {
        info!(path = %path, "Loaded configuration from explicit path");
    }

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(CONFIG_EXIT_CODE);
    }

    if !service_config.security.require_auth {
        warn!("Webhook authorization is not enforced; failures are only logged");
    }

    let processor = match build_processor(&service_config).await {
        Ok(processor) => processor,
        Err(message) => {
            error!(error = %message, "Failed to initialize webhook processing; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhooks.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, processor).await {
        error!("Failed to start server: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Assemble the document processor from configuration
async fn build_processor(config: &ServiceConfig) -> Result<Arc<DocumentCenterProcessor>, String> {
    let base_path = &config.storage.client_folders_base_path;
    match tokio::fs::metadata(base_path).await {
        Ok(metadata) if metadata.is_dir() => {}
        _ => warn!(
            path = %base_path.display(),
            "Client folders base path is not an accessible directory; deliveries will fail until it is"
        ),
    }

    let store = FilesystemRecordStore::new(config.storage.records_path.clone())
        .await
        .map_err(|e| format!("record store at {}: {e}", config.storage.records_path.display()))?;

    let downloader = HttpFileDownloader::new(&config.download.settings())
        .map_err(|e| format!("file downloader: {e}"))?;

    Ok(Arc::new(DocumentCenterProcessor::new(
        DestinationResolver::new(base_path.clone()),
        Arc::new(store),
        Arc::new(downloader),
    )))
}
