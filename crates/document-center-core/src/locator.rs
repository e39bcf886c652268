//! # Client Folder Locator
//!
//! Finds the client's folder under the base directory by tax ID substring.

use crate::WEBHOOK_LOG_TARGET;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Return the first immediate subdirectory of `base_path` whose name contains `tax_id`.
///
/// The match is a plain, case-sensitive substring search on the directory
/// name. Candidates are visited in the order the platform lists them, so when
/// several folders contain the same tax ID the winner is not deterministic;
/// a warning is logged in that case.
///
/// Returns `None` when nothing matches or when `base_path` cannot be listed.
/// Symlinks to directories count as directories.
pub async fn find_client_folder(base_path: &Path, tax_id: &str) -> Option<PathBuf> {
    let mut read_dir = match fs::read_dir(base_path).await {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!(
                target: WEBHOOK_LOG_TARGET,
                base_path = %base_path.display(),
                error = %e,
                "Failed to list client folders"
            );
            return None;
        }
    };

    let mut found: Option<PathBuf> = None;
    let mut extra_matches = 0usize;

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(
                    target: WEBHOOK_LOG_TARGET,
                    base_path = %base_path.display(),
                    error = %e,
                    "Failed to read client folder entry"
                );
                break;
            }
        };

        let name = entry.file_name();
        if !name.to_string_lossy().contains(tax_id) {
            continue;
        }

        let path = entry.path();
        let is_dir = fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }

        if found.is_none() {
            found = Some(path);
        } else {
            extra_matches += 1;
        }
    }

    match &found {
        Some(path) if extra_matches > 0 => warn!(
            target: WEBHOOK_LOG_TARGET,
            tax_id = %tax_id,
            chosen = %path.display(),
            other_matches = extra_matches,
            "Several client folders match the tax ID; using the first listed"
        ),
        Some(path) => debug!(
            target: WEBHOOK_LOG_TARGET,
            tax_id = %tax_id,
            folder = %path.display(),
            "Client folder located"
        ),
        None => {}
    }

    found
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
