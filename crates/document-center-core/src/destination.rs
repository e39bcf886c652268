//! # Destination Path Resolver
//!
//! Computes the pre-existing folder a delivered file belongs in:
//! `{client folder}/{year}/{department}/{month name}`.
//!
//! Every required field is validated and the composed directory must already
//! exist. This module never creates directories.

use crate::locator::find_client_folder;
use crate::payload::{fields, WebhookPayload};
use crate::sanitize::sanitize_segment;
use crate::WEBHOOK_LOG_TARGET;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};

/// Month names used as the last folder segment, indexed by month - 1.
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Errors raised while resolving the destination folder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Required field '{field}' is missing from the payload")]
    MissingField { field: &'static str },

    #[error("Invalid MESANO '{value}': expected six digits (MMYYYY)")]
    InvalidDateFormat { value: String },

    #[error("Invalid month '{month}'")]
    InvalidMonth { month: String },

    #[error("Field '{field}' produces an unusable path segment: '{value}'")]
    InvalidSegment { field: &'static str, value: String },

    #[error("No client folder found for tax ID '{tax_id}'")]
    ClientFolderNotFound { tax_id: String },

    #[error("Destination folder does not exist: {path}")]
    DestinationNotFound { path: PathBuf },
}

/// Month and year parsed from a `MESANO` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthYear {
    /// Two-digit month exactly as received, e.g. `"03"`
    pub month: String,
    /// Four-digit year taken literally, e.g. `"2025"`
    pub year: String,
}

impl MonthYear {
    /// Parse a `MESANO` value
    ///
    /// Non-digit characters are stripped first; exactly six digits must remain.
    /// The month is not range-checked here, see [`MonthYear::month_name`].
    ///
    /// # Examples
    ///
    /// ```
    /// use document_center_core::destination::MonthYear;
    ///
    /// let parsed = MonthYear::parse("03/2025").unwrap();
    /// assert_eq!(parsed.month, "03");
    /// assert_eq!(parsed.year, "2025");
    /// ```
    pub fn parse(value: &str) -> Result<Self, ResolveError> {
        let digits: String = value.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 6 {
            return Err(ResolveError::InvalidDateFormat {
                value: value.to_string(),
            });
        }

        let (month, year) = digits.split_at(2);
        Ok(Self {
            month: month.to_string(),
            year: year.to_string(),
        })
    }

    /// Look up the month's folder name
    pub fn month_name(&self) -> Result<&'static str, ResolveError> {
        self.month
            .parse::<usize>()
            .ok()
            .and_then(month_name)
            .ok_or_else(|| ResolveError::InvalidMonth {
                month: self.month.clone(),
            })
    }
}

/// Folder name for a 1-based month number
pub fn month_name(month: usize) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index))
        .copied()
}

/// A resolved, existing destination folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPath {
    pub client_folder: PathBuf,
    pub year: String,
    pub department: String,
    pub month_name: &'static str,
    path: PathBuf,
}

impl DestinationPath {
    /// Full path of the destination folder
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Path of a file with `file_name` inside the destination folder
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}

/// Resolves destination folders under a base directory of client folders
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    base_path: PathBuf,
}

impl DestinationResolver {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve the destination folder for `payload`
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingField`] when `CNPJ`, `MESANO` or `GRUPO` is absent or blank
    /// - [`ResolveError::ClientFolderNotFound`] when no client folder contains the tax ID
    /// - [`ResolveError::InvalidDateFormat`] when `MESANO` does not reduce to six digits
    /// - [`ResolveError::InvalidSegment`] when the department would be `.` or `..`
    /// - [`ResolveError::InvalidMonth`] when the month is outside 01-12
    /// - [`ResolveError::DestinationNotFound`] when the composed folder does not exist
    #[instrument(skip(self, payload), fields(base_path = %self.base_path.display()))]
    pub async fn resolve(&self, payload: &WebhookPayload) -> Result<DestinationPath, ResolveError> {
        let tax_id = sanitize_segment(require(payload, fields::TAX_ID)?.trim());
        if tax_id.is_empty() {
            return Err(ResolveError::MissingField {
                field: fields::TAX_ID,
            });
        }

        let client_folder = find_client_folder(&self.base_path, &tax_id)
            .await
            .ok_or_else(|| ResolveError::ClientFolderNotFound {
                tax_id: tax_id.clone(),
            })?;

        let month_year = MonthYear::parse(require(payload, fields::MONTH_YEAR)?)?;

        let department = sanitize_segment(require(payload, fields::DEPARTMENT)?);
        if matches!(department.trim(), "." | "..") {
            return Err(ResolveError::InvalidSegment {
                field: fields::DEPARTMENT,
                value: department,
            });
        }

        let month_name = month_year.month_name()?;

        let path = client_folder
            .join(&month_year.year)
            .join(&department)
            .join(month_name);

        let is_dir = fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ResolveError::DestinationNotFound { path });
        }

        debug!(
            target: WEBHOOK_LOG_TARGET,
            destination = %path.display(),
            "Destination folder resolved"
        );

        Ok(DestinationPath {
            client_folder,
            year: month_year.year,
            department,
            month_name,
            path,
        })
    }
}

fn require<'a>(payload: &'a WebhookPayload, field: &'static str) -> Result<&'a str, ResolveError> {
    payload
        .get_non_blank(field)
        .ok_or(ResolveError::MissingField { field })
}

#[cfg(test)]
#[path = "destination_tests.rs"]
mod tests;
