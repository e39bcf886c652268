//! Common test utilities for document-center-api integration tests
//!
//! This module provides:
//! - A temp-dir backed environment with a client folder tree and record store
//! - A router wired to the real processor, store and downloader
//! - Request builders

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use document_center_api::{create_router, AppState, ServiceConfig};
use document_center_core::{
    adapters::FilesystemRecordStore,
    destination::DestinationResolver,
    download::{DownloadSettings, HttpFileDownloader},
    processor::DocumentCenterProcessor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TOKEN: &str = "integration-token";
pub const CLIENT_FOLDER: &str = "ACME LTDA - 12.345.678_0001-99";

/// Filesystem layout used by one test
pub struct TestEnvironment {
    pub clients: TempDir,
    pub records: TempDir,
}

impl TestEnvironment {
    /// Client tree with `<client>/2025/Fiscal/Março` present
    pub fn new() -> Self {
        let env = Self::without_destination();
        std::fs::create_dir_all(env.destination_dir()).unwrap();
        env
    }

    /// Client folder present, but no year/department/month subtree
    pub fn without_destination() -> Self {
        let clients = TempDir::new().unwrap();
        std::fs::create_dir_all(clients.path().join(CLIENT_FOLDER)).unwrap();
        // A sibling that must not be picked
        std::fs::create_dir_all(clients.path().join("OTHER CLIENT - 98.765.432_0001-10")).unwrap();

        Self {
            clients,
            records: TempDir::new().unwrap(),
        }
    }

    pub fn destination_dir(&self) -> PathBuf {
        self.clients
            .path()
            .join(CLIENT_FOLDER)
            .join("2025")
            .join("Fiscal")
            .join("Março")
    }

    pub fn config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.security.webhook_token = Some(TOKEN.to_string());
        config.storage.client_folders_base_path = self.clients.path().to_path_buf();
        config.storage.records_path = self.records.path().to_path_buf();
        config
    }

    /// Router backed by the filesystem store and HTTP downloader
    pub async fn router(&self) -> Router {
        self.router_with_config(self.config()).await
    }

    pub async fn router_with_config(&self, config: ServiceConfig) -> Router {
        let store = FilesystemRecordStore::new(config.storage.records_path.clone())
            .await
            .unwrap();
        let downloader = HttpFileDownloader::new(&DownloadSettings {
            timeout: Duration::from_secs(5),
            ..DownloadSettings::default()
        })
        .unwrap();
        let processor = DocumentCenterProcessor::new(
            DestinationResolver::new(config.storage.client_folders_base_path.clone()),
            Arc::new(store),
            Arc::new(downloader),
        );

        create_router(AppState::new(config, Arc::new(processor)))
    }

    /// Every persisted record file
    pub fn record_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(self.records.path(), &mut files);
        files
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files);
        } else {
            files.push(path);
        }
    }
}

/// Business fields of the canonical delivery, without the file URL
pub fn document_fields() -> serde_json::Map<String, serde_json::Value> {
    let value = serde_json::json!({
        "CNPJ": "12.345.678/0001-99",
        "MESANO": "032025",
        "GRUPO": "Fiscal",
        "CODIGOEMPRESA": "01",
        "CODIGOFILIAL": "02",
        "TIPO": "NF",
        "ASSUNTO": "Janeiro",
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub fn document_payload(file_url: &str) -> serde_json::Value {
    let mut fields = document_fields();
    fields.insert("URL_ARQUIVO".to_string(), file_url.into());
    serde_json::Value::Object(fields)
}

pub fn json_webhook(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
