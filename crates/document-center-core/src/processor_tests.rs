//! Tests for webhook processing orchestration.

use super::*;
use crate::adapters::InMemoryRecordStore;
use crate::download::{DownloadSettings, HttpFileDownloader};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_FOLDER: &str = "ACME LTDA - 12.345.678_0001-99";

/// Downloader that counts calls and never touches the network
#[derive(Default)]
struct CountingDownloader {
    calls: AtomicUsize,
}

#[async_trait]
impl FileDownloader for CountingDownloader {
    async fn download(&self, _url: &Url, destination: &Path) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(destination, b"stub")
            .await
            .map_err(|e| DownloadError::FileWriteError {
                path: destination.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(4)
    }
}

/// Store that rejects every write
struct FailingStore;

#[async_trait]
impl WebhookRecordStore for FailingStore {
    async fn store_record(&self, _record: &WebhookRecord) -> Result<RecordReceipt, StoreError> {
        Err(StoreError::Io {
            message: "disk full".to_string(),
        })
    }

    async fn get_record(&self, _record_id: &RecordId) -> Result<Option<WebhookRecord>, StoreError> {
        Ok(None)
    }
}

fn client_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(destination_dir(temp_dir.path())).unwrap();
    temp_dir
}

fn destination_dir(base: &Path) -> PathBuf {
    base.join(CLIENT_FOLDER)
        .join("2025")
        .join("Fiscal")
        .join("Março")
}

fn document_payload(file_url: &str) -> WebhookPayload {
    [
        (fields::FILE_URL, file_url),
        (fields::TAX_ID, "12.345.678/0001-99"),
        (fields::MONTH_YEAR, "032025"),
        (fields::DEPARTMENT, "Fiscal"),
        (fields::COMPANY_CODE, "01"),
        (fields::BRANCH_CODE, "02"),
        (fields::DOCUMENT_TYPE, "NF"),
        (fields::SUBJECT, "Janeiro"),
    ]
    .into_iter()
    .collect()
}

fn http_processor(
    base: &Path,
    store: Arc<dyn WebhookRecordStore>,
) -> DocumentCenterProcessor {
    let downloader = HttpFileDownloader::new(&DownloadSettings::default()).unwrap();
    DocumentCenterProcessor::new(DestinationResolver::new(base), store, Arc::new(downloader))
}

#[tokio::test]
async fn test_document_is_downloaded_into_client_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 content".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = client_tree();
    let store = Arc::new(InMemoryRecordStore::new());
    let processor = http_processor(temp_dir.path(), store.clone());

    let report = processor
        .process(document_payload(&format!("{}/doc.pdf", server.uri())))
        .await;

    assert!(report.is_success());
    let expected = destination_dir(temp_dir.path()).join("01-02-NF-Janeiro.pdf");
    match &report.file {
        FileOutcome::Stored { path, bytes } => {
            assert_eq!(path, &expected);
            assert_eq!(*bytes, 16);
        }
        other => panic!("expected stored file, got {other:?}"),
    }
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.4 content");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_persisted_record_carries_payload_fields() {
    let temp_dir = client_tree();
    let store = Arc::new(InMemoryRecordStore::new());
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        store.clone(),
        Arc::new(CountingDownloader::default()),
    );

    let report = processor
        .process(document_payload("https://files.example.com/doc.pdf"))
        .await;

    let receipt = report.persistence.as_ref().unwrap();
    assert_eq!(receipt.record_id, report.record_id);

    let record = store.get_record(&report.record_id).await.unwrap().unwrap();
    assert_eq!(record.fields.get("CNPJ").unwrap(), "12.345.678/0001-99");
    assert_eq!(record.fields.len(), 8);
}

#[tokio::test]
async fn test_missing_url_skips_download_but_persists() {
    let temp_dir = client_tree();
    let store = Arc::new(InMemoryRecordStore::new());
    let downloader = Arc::new(CountingDownloader::default());
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        store.clone(),
        downloader.clone(),
    );

    let mut payload = document_payload("");
    payload.insert(fields::FILE_URL, "   ");
    let report = processor.process(payload).await;

    assert!(report.is_success());
    assert!(matches!(report.file, FileOutcome::Skipped));
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_missing_destination_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    // Client folder exists but has no 2025/Fiscal/Março subtree
    std::fs::create_dir_all(temp_dir.path().join(CLIENT_FOLDER)).unwrap();

    let store = Arc::new(InMemoryRecordStore::new());
    let downloader = Arc::new(CountingDownloader::default());
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        store.clone(),
        downloader.clone(),
    );

    let report = processor
        .process(document_payload("https://files.example.com/doc.pdf"))
        .await;

    assert!(!report.is_success());
    assert!(report.persistence.is_ok());
    match &report.file {
        FileOutcome::Failed(e) => assert_eq!(e.kind(), "DestinationNotFound"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    assert!(!temp_dir.path().join(CLIENT_FOLDER).join("2025").exists());
}

#[tokio::test]
async fn test_unknown_client_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(CountingDownloader::default()),
    );

    let report = processor
        .process(document_payload("https://files.example.com/doc.pdf"))
        .await;

    match &report.file {
        FileOutcome::Failed(e) => assert_eq!(e.kind(), "ClientFolderNotFound"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_persistence_failure_does_not_block_download() {
    let temp_dir = client_tree();
    let downloader = Arc::new(CountingDownloader::default());
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        Arc::new(FailingStore),
        downloader.clone(),
    );

    let report = processor
        .process(document_payload("https://files.example.com/doc.pdf"))
        .await;

    assert!(!report.is_success());
    assert!(matches!(report.persistence, Err(StoreError::Io { .. })));
    assert!(matches!(report.file, FileOutcome::Stored { .. }));
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_error_is_download_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp_dir = client_tree();
    let processor = http_processor(temp_dir.path(), Arc::new(InMemoryRecordStore::new()));

    let report = processor
        .process(document_payload(&format!("{}/missing.pdf", server.uri())))
        .await;

    match &report.file {
        FileOutcome::Failed(e) => {
            assert_eq!(e.kind(), "DownloadFailed");
            assert!(matches!(
                e,
                DeliveryError::Download(DownloadError::DownloadFailed { status: 404 })
            ));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let written = std::fs::read_dir(destination_dir(temp_dir.path()))
        .unwrap()
        .count();
    assert_eq!(written, 0);
}

#[tokio::test]
async fn test_unparseable_url_is_invalid_url() {
    let temp_dir = client_tree();
    let downloader = Arc::new(CountingDownloader::default());
    let processor = DocumentCenterProcessor::new(
        DestinationResolver::new(temp_dir.path()),
        Arc::new(InMemoryRecordStore::new()),
        downloader.clone(),
    );

    let report = processor.process(document_payload("not a url")).await;

    match &report.file {
        FileOutcome::Failed(e) => assert_eq!(e.kind(), "InvalidUrl"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
}

mod parse_file_url_tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(parse_file_url("http://example.com/a.pdf").is_ok());
        assert!(parse_file_url("https://example.com/a.pdf").is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let url = parse_file_url("  https://example.com/a.pdf \n").unwrap();
        assert_eq!(url.path(), "/a.pdf");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = parse_file_url("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidUrl { .. }));
    }

    #[test]
    fn test_require_file_url_reports_missing_field() {
        let err = require_file_url(&WebhookPayload::new()).unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::MissingField {
                field: fields::FILE_URL
            }
        ));
        assert_eq!(err.kind(), "MissingField");
    }
}
