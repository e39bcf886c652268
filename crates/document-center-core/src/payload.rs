//! # Webhook Payload
//!
//! Untyped field-name to string-value mapping carried by a document-delivery
//! notification, plus the parsers for the body encodings senders use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Recognized payload keys.
pub mod fields {
    /// URL of the file to download
    pub const FILE_URL: &str = "URL_ARQUIVO";
    /// Client tax ID (CNPJ)
    pub const TAX_ID: &str = "CNPJ";
    /// Month and year as `MMYYYY`
    pub const MONTH_YEAR: &str = "MESANO";
    /// Department name
    pub const DEPARTMENT: &str = "GRUPO";
    /// Company code
    pub const COMPANY_CODE: &str = "CODIGOEMPRESA";
    /// Branch code
    pub const BRANCH_CODE: &str = "CODIGOFILIAL";
    /// Document type
    pub const DOCUMENT_TYPE: &str = "TIPO";
    /// Document subject
    pub const SUBJECT: &str = "ASSUNTO";
}

/// Errors raised while decoding a request body
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Body is not a JSON object")]
    NotAnObject,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Body is neither a JSON object nor form-encoded data")]
    Unrecognized,
}

/// Body encodings accepted on the webhook endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
    /// No usable content type; try JSON first, then form
    Unknown,
}

impl BodyFormat {
    /// Derive the body format from a `Content-Type` header value
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(value) = content_type else {
            return Self::Unknown;
        };

        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" || mime.ends_with("+json") {
            Self::Json
        } else if mime == "application/x-www-form-urlencoded" {
            Self::Form
        } else {
            Self::Unknown
        }
    }
}

/// Field mapping received in a webhook body
///
/// No schema is enforced here; consumers read the keys they recognize and
/// decide how to treat absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookPayload {
    fields: BTreeMap<String, String>,
}

impl WebhookPayload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a body according to `format`
    ///
    /// An empty (or whitespace-only) body decodes to an empty payload.
    pub fn parse(body: &[u8], format: BodyFormat) -> Result<Self, PayloadError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        match format {
            BodyFormat::Json => Self::from_json(body),
            BodyFormat::Form => Ok(Self::from_form(body)),
            BodyFormat::Unknown => Self::from_json(body).or_else(|_| {
                if looks_like_form(body) {
                    Ok(Self::from_form(body))
                } else {
                    Err(PayloadError::Unrecognized)
                }
            }),
        }
    }

    /// Decode a JSON object body
    ///
    /// Strings are kept as-is, numbers and booleans are stringified, `null`
    /// counts as absent, and nested arrays or objects keep their JSON text.
    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let serde_json::Value::Object(map) = value else {
            return Err(PayloadError::NotAnObject);
        };

        let fields = map
            .into_iter()
            .filter_map(|(key, value)| json_scalar_to_string(value).map(|v| (key, v)))
            .collect();

        Ok(Self { fields })
    }

    /// Decode an `application/x-www-form-urlencoded` body
    ///
    /// Repeated keys keep the last value.
    pub fn from_form(body: &[u8]) -> Self {
        let fields = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { fields }
    }

    /// Merge query-string parameters; keys already present keep their body value
    pub fn merge_query(&mut self, query: &str) {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.fields
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Get a field value exactly as received
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Get a field value, treating empty or whitespace-only values as absent
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// The URL of the file to download, if any
    pub fn file_url(&self) -> Option<&str> {
        self.get_non_blank(fields::FILE_URL)
    }

    /// Iterate fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for WebhookPayload
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Some(nested.to_string())
        }
    }
}

fn looks_like_form(body: &[u8]) -> bool {
    std::str::from_utf8(body)
        .map(|text| {
            text.split('&')
                .filter(|pair| !pair.is_empty())
                .all(|pair| pair.contains('=') && !pair.starts_with('='))
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
