//! Tests for [`ServiceConfig`] defaults and validation.

use super::*;

fn config_with_token() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.security.webhook_token = Some("s3cret".to_string());
    config
}

#[test]
fn test_defaults() {
    let config = ServiceConfig::default();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.webhooks.endpoint_path, "/webhook");
    assert!(config.security.require_auth);
    assert!(config.download.verify_tls);
    assert_eq!(config.download.timeout_seconds, 30);
    assert_eq!(config.download.connect_timeout_seconds, 10);
    assert!(config.logging.webhook_log_file.is_none());
}

#[test]
fn test_configured_token_passes_validation() {
    assert!(config_with_token().validate().is_ok());
}

#[test]
fn test_enforced_auth_without_token_is_rejected() {
    let result = ServiceConfig::default().validate();
    match result {
        Err(ConfigError::Missing { key }) => assert_eq!(key, "security.webhook_token"),
        other => panic!("expected missing token, got {other:?}"),
    }
}

#[test]
fn test_logging_only_auth_does_not_need_token() {
    let mut config = ServiceConfig::default();
    config.security.require_auth = false;
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_token_counts_as_unset() {
    let mut config = ServiceConfig::default();
    config.security.webhook_token = Some(String::new());
    assert!(config.security.webhook_token().is_none());
    assert!(config.validate().is_err());
}

#[test]
fn test_endpoint_path_must_be_absolute() {
    let mut config = config_with_token();
    config.webhooks.endpoint_path = "webhook".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_empty_base_path_is_rejected() {
    let mut config = config_with_token();
    config.storage.client_folders_base_path = PathBuf::new();
    assert!(matches!(config.validate(), Err(ConfigError::Missing { .. })));
}

#[test]
fn test_zero_timeouts_are_rejected() {
    let mut config = config_with_token();
    config.download.timeout_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = config_with_token();
    config.download.connect_timeout_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_token_fallback_fills_missing_token() {
    let config = ServiceConfig::default().with_token_fallback(Some("from-env".to_string()));
    assert_eq!(config.security.webhook_token.as_deref(), Some("from-env"));
}

#[test]
fn test_token_fallback_keeps_configured_token() {
    let config = config_with_token().with_token_fallback(Some("from-env".to_string()));
    assert_eq!(config.security.webhook_token.as_deref(), Some("s3cret"));
}

#[test]
fn test_token_fallback_ignores_empty_value() {
    let config = ServiceConfig::default().with_token_fallback(Some(String::new()));
    assert!(config.security.webhook_token.is_none());
}

#[test]
fn test_debug_redacts_token() {
    let debug_str = format!("{:?}", config_with_token());
    assert!(
        !debug_str.contains("s3cret"),
        "debug output must not leak secret: {debug_str}"
    );
    assert!(debug_str.contains("REDACTED"));
}

#[test]
fn test_partial_json_uses_defaults() {
    let json = r#"{ "server": { "port": 9090 }, "download": { "verify_tls": false } }"#;
    let config: ServiceConfig = serde_json::from_str(json).expect("partial config parses");

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(!config.download.verify_tls);
    assert_eq!(config.download.timeout_seconds, 30);
    assert!(config.security.require_auth);
}

#[test]
fn test_download_settings_conversion() {
    let mut config = ServiceConfig::default();
    config.download.timeout_seconds = 5;
    config.download.connect_timeout_seconds = 2;
    config.download.verify_tls = false;

    let settings = config.download.settings();
    assert_eq!(settings.timeout, Duration::from_secs(5));
    assert_eq!(settings.connect_timeout, Duration::from_secs(2));
    assert!(!settings.verify_tls);
}
