use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use courier_app::{AppConfig, ConfigError};
use pretty_assertions::assert_eq;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_without_a_file() {
    let config = AppConfig::load(None).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.bind, "127.0.0.1:3000");
    assert_eq!(config.batch.default_limit, 10);
    assert_eq!(config.batch.settings().item_pause, Duration::from_millis(500));
    assert_eq!(config.fetch.settings().request_timeout, Duration::from_secs(10));
    assert!(config.relay.validate().is_err());
}

#[test]
fn ron_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"(
            bind: "0.0.0.0:8080",
            batch: (default_limit: 3, item_pause_ms: 0),
            relay: (host: Some("smtp.example.com"), port: Some(465)),
        )"#
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.bind, "0.0.0.0:8080");
    assert_eq!(config.batch.default_limit, 3);
    assert_eq!(config.batch.settings().item_pause, Duration::ZERO);
    assert_eq!(config.batch.channel_capacity, 32);
    assert_eq!(config.relay.host.as_deref(), Some("smtp.example.com"));
    assert_eq!(config.relay.port, Some(465));
    assert_eq!(config.log_level, "info");
}

#[test]
fn unreadable_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.ron");
    assert!(matches!(
        AppConfig::load(Some(missing.as_path())),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn malformed_file_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "(bind: 42").unwrap();
    assert!(matches!(
        AppConfig::load(Some(file.path())),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn environment_completes_the_relay() {
    let mut config = AppConfig::default();
    config
        .apply_env(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_USER", "sender@example.com"),
            ("SMTP_PASSWORD", "secret"),
            ("COURIER_BIND", "0.0.0.0:9000"),
        ]))
        .unwrap();

    let relay = config.relay.validate().expect("relay complete");
    assert!(relay.implicit_tls());
    assert_eq!(relay.from.email.to_string(), "sender@example.com");
    assert_eq!(config.bind, "0.0.0.0:9000");
}

#[test]
fn blank_environment_values_are_ignored() {
    let mut config = AppConfig::default();
    config.relay.host = Some("from-file.example.com".to_string());
    config.apply_env(env(&[("SMTP_HOST", "  ")])).unwrap();
    assert_eq!(config.relay.host.as_deref(), Some("from-file.example.com"));
}

#[test]
fn bad_port_is_a_config_error() {
    let mut config = AppConfig::default();
    let err = config.apply_env(env(&[("SMTP_PORT", "smtp")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { name: "SMTP_PORT", .. }));
}
