//! Integration tests for CLI config command
//!
//! Tests file I/O operations for the `agrirelay config` subcommand.

use agrirelay::cli::generate_config_template;
use agrirelay::config::Config;
use std::fs;
use tempfile::TempDir;

/// Helper to create temporary directory for file operations
fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn test_template_file_content_matches_generation() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");

    let template = generate_config_template();
    fs::write(&config_path, template).expect("Failed to write template");

    let content = fs::read_to_string(&config_path).expect("Failed to read back");
    assert_eq!(content, template);
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let temp_dir = create_temp_dir();
    let config = Config::load(temp_dir.path().join("absent.toml"))
        .expect("missing file should not be an error");

    assert_eq!(config.server.port, 3000);
}

#[test]
fn test_invalid_config_file_reports_path() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("broken.toml");
    fs::write(&config_path, "[server\nport = ").expect("Failed to write file");

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(
        err.to_string().contains("broken.toml"),
        "error should name the file: {}",
        err
    );
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[generation]\nbase_url = \"localhost:11434\"\n",
    )
    .expect("Failed to write file");

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration"), "{}", err);
}
