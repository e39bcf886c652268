//! # Document Center HTTP Service
//!
//! HTTP server receiving document-delivery webhooks.
//!
//! This service provides:
//! - The webhook endpoint with bearer token authorization
//! - A liveness endpoint (`/ping`)
//! - Request logging with correlation IDs

pub mod config;
pub mod errors;
pub mod responses;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;


pub use config::{
    DownloadConfig, LoggingConfig, SecurityConfig, ServerConfig, ServiceConfig, StorageConfig,
    WebhookConfig,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use responses::{PingResponse, WebhookResponse};

use axum::{
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{header, HeaderMap},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use document_center_core::{
    auth::BearerTokenValidator,
    payload::{BodyFormat, WebhookPayload},
    processor::{DocumentProcessor, FileOutcome},
    WEBHOOK_LOG_TARGET,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Processor for authorized webhook payloads
    pub processor: Arc<dyn DocumentProcessor>,

    /// Bearer token check for the webhook endpoint
    pub auth: BearerTokenValidator,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, processor: Arc<dyn DocumentProcessor>) -> Self {
        let auth = BearerTokenValidator::new(config.security.webhook_token());
        Self {
            config,
            processor,
            auth,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes =
        Router::new().route(&state.config.webhooks.endpoint_path, post(handle_webhook));

    let ping_routes = Router::new().route("/ping", get(handle_ping).post(handle_ping));

    Router::new()
        .merge(webhook_routes)
        .merge(ping_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM, then lets in-flight requests finish for at
/// most `server.shutdown_timeout_seconds`.
pub async fn start_server(
    config: ServiceConfig,
    processor: Arc<dyn DocumentProcessor>,
) -> Result<(), ServiceError> {
    config.validate()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let app = create_router(AppState::new(config, processor));

    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(shutdown_timeout).await;
            let _ = shutdown_tx.send(true);
        })
        .into_future();

    let drain_deadline = async move {
        if shutdown_rx.wait_for(|stopping| *stopping).await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle a document-delivery webhook
///
/// 1. Check the bearer token (401 when enforcement is on)
/// 2. Parse the body, merging query-string parameters
/// 3. Hand the payload to the processor, which persists it and delivers the
///    referenced file
/// 4. Answer 200 only when every step succeeded, 500 otherwise
#[instrument(skip(state, headers, query, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    info!(body_size = body.len(), "Received webhook request");

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = state.auth.validate(authorization) {
        error!(
            target: WEBHOOK_LOG_TARGET,
            error = %e,
            enforced = state.config.security.require_auth,
            "Webhook authorization failed"
        );
        if state.config.security.require_auth {
            return Err(WebhookHandlerError::Unauthorized(e));
        }
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let mut payload = WebhookPayload::parse(&body, BodyFormat::from_content_type(content_type))?;
    if let Some(query) = query.as_deref() {
        payload.merge_query(query);
    }

    let report = state.processor.process(payload).await;

    if report.is_success() {
        info!(record_id = %report.record_id, "Webhook processed successfully");
        return Ok(Json(WebhookResponse::success()));
    }

    let mut failures = Vec::new();
    if let Err(e) = &report.persistence {
        failures.push(format!("persistence: {e}"));
    }
    if let FileOutcome::Failed(e) = &report.file {
        failures.push(format!("file ({}): {e}", e.kind()));
    }

    Err(WebhookHandlerError::Internal {
        message: format!("webhook {} failed: {}", report.record_id, failures.join("; ")),
    })
}

/// Liveness check
async fn handle_ping() -> Json<PingResponse> {
    Json(PingResponse::ok())
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// Reuses the caller's `x-correlation-id` or generates one, records it on the
/// span, echoes it in the response and logs completion at a level derived
/// from the status code.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}
