//! # Filename Generator
//!
//! Builds `{company}-{branch}-{type}-{subject}.{ext}` from the payload and the
//! file URL.

use crate::payload::{fields, WebhookPayload};
use crate::sanitize::sanitize_segment;
use url::Url;

pub const UNKNOWN_COMPANY: &str = "unknown_empresa";
pub const UNKNOWN_BRANCH: &str = "unknown_filial";
pub const UNKNOWN_TYPE: &str = "unknown_tipo";
pub const UNKNOWN_SUBJECT: &str = "unknown_assunto";

/// Generate the stored filename for a delivered document
///
/// Absent components fall back to their `unknown_*` placeholder. Every
/// component, the extension included, goes through
/// [`sanitize_segment`]. The extension is not validated and may be empty, in
/// which case the name ends with a dot.
///
/// # Examples
///
/// ```
/// use document_center_core::filename::generate_file_name;
/// use document_center_core::payload::WebhookPayload;
/// use url::Url;
///
/// let payload: WebhookPayload = [("CODIGOEMPRESA", "01"), ("TIPO", "NF")]
///     .into_iter()
///     .collect();
/// let url = Url::parse("http://files.example/doc.pdf").unwrap();
///
/// assert_eq!(
///     generate_file_name(&payload, &url),
///     "01-unknown_filial-NF-unknown_assunto.pdf"
/// );
/// ```
pub fn generate_file_name(payload: &WebhookPayload, file_url: &Url) -> String {
    let component = |key: &str, fallback: &str| sanitize_segment(payload.get(key).unwrap_or(fallback));

    let company = component(fields::COMPANY_CODE, UNKNOWN_COMPANY);
    let branch = component(fields::BRANCH_CODE, UNKNOWN_BRANCH);
    let document_type = component(fields::DOCUMENT_TYPE, UNKNOWN_TYPE);
    let subject = component(fields::SUBJECT, UNKNOWN_SUBJECT);
    let extension = sanitize_segment(url_extension(file_url));

    format!("{company}-{branch}-{document_type}-{subject}.{extension}")
}

/// Extension of the last path segment of `url`, without the dot
///
/// Trailing slashes are ignored, so `/doc.pdf/` yields `pdf`. Percent-encoding
/// is preserved. Returns an empty string when the last segment has no dot.
pub fn url_extension(url: &Url) -> &str {
    let last_segment = url
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    last_segment
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "filename_tests.rs"]
mod tests;
