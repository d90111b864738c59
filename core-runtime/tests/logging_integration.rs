//! Integration tests for logging system

use bridge_traits::log::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, LogLevel::Info);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
    assert!(config.filter.is_none());
    assert!(config.logger_sink.is_none());

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn test_provider_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("refresh_token", "r-123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer abc"), "[REDACTED]");
}

#[test]
fn test_email_values_are_masked() {
    let redacted = redact_if_sensitive("owner", "listener@example.com");

    assert!(redacted.starts_with('l'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_catalog_values_pass_through() {
    assert_eq!(redact_if_sensitive("track_id", "4uLU6hMCjMI75M1A2tKUQC"), "4uLU6hMCjMI75M1A2tKUQC");
    assert_eq!(redact_if_sensitive("name", "Foo - Bar - Baz"), "Foo - Bar - Baz");
    assert_eq!(redact_if_sensitive("pair", "Spotify:Tidal"), "Spotify:Tidal");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/.local/share/catalog-transfer/mappings.json"), "mappings.json");
    assert_eq!(strip_path("C:\\Users\\Ana\\AppData\\mappings.json"), "mappings.json");
    assert_eq!(strip_path("export.json"), "export.json");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("core_transfer=debug")
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.filter.as_deref(), Some("core_transfer=debug"));
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
