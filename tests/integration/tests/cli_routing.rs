//! CLI routing integration tests.
//!
//! Drive the CLI library the way the `gpioproxy` binary does.

use clap::Parser;
use gpioproxy_cli::{run, Cli};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_cli_version() {
    let cli = Cli::try_parse_from(["gpioproxy", "version"]).unwrap();
    run(cli).await.unwrap();
}

#[tokio::test]
async fn test_cli_check_valid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpioproxy.json5");
    fs::write(
        &path,
        "{ devices: [{ id: 'led1', class: 'LED', args: [17] }, { id: 'pir', class: 'MotionSensor', args: ['GPIO23'] }] }",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["gpioproxy", "--config", path.to_str().unwrap(), "check"]).unwrap();
    run(cli).await.unwrap();
}

#[tokio::test]
async fn test_cli_check_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpioproxy.json5");
    fs::write(&path, "{ server: { port: 0 } }").unwrap();

    let cli = Cli::try_parse_from(["gpioproxy", "--config", path.to_str().unwrap(), "check"]).unwrap();
    assert!(run(cli).await.is_err());
}

#[tokio::test]
async fn test_cli_run_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json5");

    let cli = Cli::try_parse_from(["gpioproxy", "--config", path.to_str().unwrap(), "run"]).unwrap();
    let err = run(cli).await.unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}

#[test]
fn test_cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["gpioproxy", "fly"]).is_err());
}
