//! # Webhook Authorization
//!
//! Shared-secret bearer token check for incoming webhooks.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use subtle::ConstantTimeEq;
use thiserror::Error;

static BEARER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s(\S+)").expect("bearer pattern is valid"));

/// Why a request failed the token check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header does not carry a bearer token")]
    MalformedHeader,

    #[error("Bearer token does not match")]
    InvalidToken,

    #[error("No webhook token is configured")]
    NotConfigured,
}

/// Shared secret expected from webhook senders
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookToken(String);

impl WebhookToken {
    /// Wrap a secret; returns `None` for an empty string
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for WebhookToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookToken(<REDACTED>)")
    }
}

/// Extract the token from an `Authorization` header value
///
/// Searches for `Bearer <token>` anywhere in the value; the token is the run
/// of non-whitespace characters after the first whitespace.
///
/// # Examples
///
/// ```
/// use document_center_core::auth::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
/// assert_eq!(extract_bearer_token("Basic dXNlcg=="), None);
/// ```
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    BEARER_PATTERN
        .captures(header_value)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

/// Validates `Authorization` headers against the configured token
#[derive(Debug, Clone)]
pub struct BearerTokenValidator {
    token: Option<WebhookToken>,
}

impl BearerTokenValidator {
    pub fn new(token: Option<WebhookToken>) -> Self {
        Self { token }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Check an `Authorization` header value
    ///
    /// Comparison is constant time in the token contents. With no token
    /// configured every request fails with [`AuthError::NotConfigured`].
    pub fn validate(&self, header_value: Option<&str>) -> Result<(), AuthError> {
        let header_value = header_value.ok_or(AuthError::MissingHeader)?;
        let candidate = extract_bearer_token(header_value).ok_or(AuthError::MalformedHeader)?;
        let expected = self.token.as_ref().ok_or(AuthError::NotConfigured)?;

        if expected.matches(candidate) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
