//! Layered configuration loading.
//!
//! Sources (applied in order, later sources override earlier ones):
//!  1. `/etc/document-center/service.yaml`, system-wide defaults
//!  2. `./config/service.yaml`, deployment-local override
//!  3. Path given by `DC_CONFIG_FILE`, operator-specified file
//!  4. Environment variables prefixed `DC__` (double-underscore separator),
//!     e.g. `DC__SERVER__PORT=9090` sets `server.port = 9090`
//!
//! Absent files are skipped except for the explicit one. A malformed file or
//! a variable that cannot be coerced to its field type is an error.

use document_center_api::ServiceConfig;
use std::path::Path;

pub const SYSTEM_CONFIG_FILE: &str = "/etc/document-center/service";
pub const LOCAL_CONFIG_FILE: &str = "config/service";
pub const CONFIG_FILE_ENV: &str = "DC_CONFIG_FILE";
pub const ENV_PREFIX: &str = "DC";

/// Legacy variable holding the webhook secret
pub const TOKEN_FALLBACK_ENV: &str = "WEBHOOK_TOKEN";

/// Build the service configuration from every source
pub fn load_service_config(explicit_path: Option<&str>) -> Result<ServiceConfig, config::ConfigError> {
    build_layered_config(explicit_path)?.try_deserialize()
}

/// Merge every source without deserializing
fn build_layered_config(explicit_path: Option<&str>) -> Result<config::Config, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(SYSTEM_CONFIG_FILE)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(LOCAL_CONFIG_FILE)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
        builder = builder.add_source(
            config::File::from(Path::new(path))
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
