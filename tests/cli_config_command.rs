//! Integration tests for CLI config command
//!
//! Tests file I/O operations for the `judgeprobe config` subcommand.
//! Verifies template generation, file writing, and loading the result back.

use judgeprobe::cli::generate_config_template;
use judgeprobe::config::Config;
use judgeprobe::error::AppError;
use judgeprobe::probe::ProbeMode;
use std::fs;
use tempfile::TempDir;

/// Helper to create temporary directory for file operations
fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("judgeprobe.toml");

    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");

    assert_eq!(config.probe.mode, ProbeMode::FirstSuccess);
    assert_eq!(config.probe.timeout_seconds, 10);
    assert_eq!(config.probe.listing_timeout_seconds, 5);
    assert_eq!(config.endpoint.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.judges.retry_budget, 10);

    let server = config.server.expect("template has a server section");
    assert_eq!(server.max_attempts, 60);
    assert_eq!(server.readiness_policy().max_attempts(), 60);
}

#[test]
fn test_template_matches_defaults_where_documented() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("judgeprobe.toml");
    fs::write(&config_path, generate_config_template()).unwrap();

    let from_template = Config::from_file(&config_path).unwrap();
    let defaults = Config::default();

    assert_eq!(from_template.probe.candidates, defaults.probe.candidates);
    assert_eq!(from_template.normalization, defaults.normalization);
    assert_eq!(from_template.endpoint.chat_path, defaults.endpoint.chat_path);
}

#[test]
fn test_missing_file_reports_path() {
    let temp_dir = create_temp_dir();
    let missing = temp_dir.path().join("absent.toml");

    let err = Config::from_file(&missing).unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_invalid_file_reports_validation_failure() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[probe]\ntimeout_seconds = 0\n").unwrap();

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
}
