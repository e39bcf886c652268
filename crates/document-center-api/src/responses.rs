//! Response bodies for the API.

use serde::Serialize;

/// Body of a fully processed webhook
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

impl WebhookResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}

impl PingResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
