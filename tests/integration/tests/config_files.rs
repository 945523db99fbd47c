//! Config file loading integration tests.
//!
//! These tests write JSON5 files to disk and check what the proxy reads
//! back, including the catalog served by `list_devices`.

use gpioproxy_core::config::{Config, LogLevel};
use gpioproxy_core::DeviceDescriptor;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_devices_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpioproxy.json5");
    fs::write(
        &path,
        r#"{
          server: { port: 9090 },
          logging: { level: 'debug' },
          devices: [
            { id: 'led1', class: 'LED', args: [17] },
            { id: 'fan', class: 'PWMOutputDevice', kwargs: { pin: 'GPIO12', frequency: 50 } },
          ],
        }"#,
    )
    .unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.server.port, 9090);
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert_eq!(loaded.devices[1].kwargs["pin"], serde_json::json!("GPIO12"));
    assert_eq!(
        loaded.catalog(),
        vec![
            DeviceDescriptor::new("led1", "LED"),
            DeviceDescriptor::new("fan", "PWMOutputDevice"),
        ]
    );
    loaded.validate().unwrap();
}

#[test]
fn test_hand_written_json5() {
    let config = Config::parse(
        r#"
        // Living room
        {
          server: { port: 8800 },
          devices: [
            { id: 'led1', class: 'LED', args: [17] },
            { id: 'button1', class: 'Button', kwargs: { pin: 4, }, },
          ],
        }
        "#,
    )
    .unwrap();
    assert_eq!(config.server.port, 8800);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.devices.len(), 2);
    config.validate().unwrap();
}

#[test]
fn test_invalid_file_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpioproxy.json5");
    fs::write(
        &path,
        "{ devices: [ { id: 'a', class: 'LED' }, { id: 'a', class: 'LED' } ] }",
    )
    .unwrap();

    let loaded = Config::load(&path).unwrap();
    let err = loaded.validate().unwrap_err().to_string();
    assert!(err.contains("duplicate id 'a'"), "{}", err);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/gpioproxy.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
