//! Tests for loading the configuration file and connecting with it

use std::io::Write;

use assert_matches::assert_matches;
use icinga_bridge::client::icinga::IcingaClient;
use icinga_bridge::config::{ConfigError, read_config_file};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_read_config_with_defaults() {
    let file = write_config(
        r#"{
            "url": "https://icinga.example.com:5665",
            "username": "root",
            "password": "icinga"
        }"#,
    );

    let config = read_config_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.url, "https://icinga.example.com:5665");
    assert!(!config.debug);
    assert_eq!(config.prefix(), "");
    assert_eq!(config.timeout, 10);
    assert_eq!(config.check_command, "hostalive");
    assert!(config.validate().is_ok());
}

#[test]
fn test_read_config_with_all_settings() {
    let file = write_config(
        r#"{
            "url": "https://icinga.example.com",
            "username": "root",
            "password": "icinga",
            "debug": true,
            "prefix": "telegraf.",
            "timeout": 3,
            "check_command": "dummy",
            "insecure_tls": true
        }"#,
    );

    let config = read_config_file(file.path().to_str().unwrap()).unwrap();

    assert!(config.debug);
    assert_eq!(config.prefix(), "telegraf.");
    assert_eq!(config.timeout, 3);
    assert_eq!(config.check_command, "dummy");
    assert!(config.insecure_tls);
}

#[test]
fn test_invalid_config_file() {
    let file = write_config("{ not json");

    assert!(read_config_file(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_missing_config_file() {
    assert!(read_config_file("/nonexistent/icinga-bridge.json").is_err());
}

#[test]
fn test_connect_rejects_plain_http() {
    let file = write_config(
        r#"{
            "url": "http://icinga.example.com",
            "username": "root",
            "password": "icinga"
        }"#,
    );
    let config = read_config_file(file.path().to_str().unwrap()).unwrap();

    assert_matches!(
        IcingaClient::connect(&config),
        Err(ConfigError::UnsupportedScheme(_))
    );
}

#[test]
fn test_connect_with_valid_config() {
    let file = write_config(
        r#"{
            "url": "https://icinga.example.com:5665",
            "username": "root",
            "password": "icinga"
        }"#,
    );
    let config = read_config_file(file.path().to_str().unwrap()).unwrap();

    let client = IcingaClient::connect(&config).unwrap();

    assert_eq!(client.base_url().as_str(), "https://icinga.example.com:5665/");
}
