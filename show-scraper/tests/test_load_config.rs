use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

use show_scraper::load_config::{load_config, load_config_from_env};

fn clear_overrides() {
    env::remove_var("TVMAZE_API_BASE_URL");
    env::remove_var("SHOWS_DB_PATH");
}

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A fully specified config file maps onto every section.
#[test]
#[serial]
fn test_load_config_full_file() {
    clear_overrides();
    let config_file = config_file(
        r#"
source:
  base_url: "http://localhost:8080"
  request_timeout_secs: 12
  retry:
    max_retries: 5
    backoff_step_secs: 2
storage:
  database_path: ./tmp/shows.db
worker:
  poll_interval_secs: 300
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.source.base_url, "http://localhost:8080");
    assert_eq!(config.source.request_timeout(), Duration::from_secs(12));
    assert_eq!(config.source.retry.max_retries, 5);
    assert_eq!(config.source.retry.policy().delay_for(3), Duration::from_secs(6));
    assert_eq!(
        config.storage.database_path,
        Some(PathBuf::from("./tmp/shows.db"))
    );
    assert_eq!(config.worker.poll_interval(), Duration::from_secs(300));
}

/// Omitted keys fall back to the production defaults.
#[test]
#[serial]
fn test_load_config_partial_file_uses_defaults() {
    clear_overrides();
    let config_file = config_file("storage:\n  database_path: shows.db\n");

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.source.base_url, "https://api.tvmaze.com");
    assert_eq!(config.source.retry.max_retries, 3);
    assert_eq!(config.source.retry.backoff_step_secs, 10);
    assert_eq!(config.worker.poll_interval_secs, 60);
    assert_eq!(config.storage.database_path, Some(PathBuf::from("shows.db")));
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_overrides();
    let config_file = config_file(
        "source:\n  base_url: \"http://from-file.example\"\nstorage:\n  database_path: file.db\n",
    );
    env::set_var("TVMAZE_API_BASE_URL", "http://from-env.example");
    env::set_var("SHOWS_DB_PATH", "/var/lib/shows/env.db");

    let result = load_config(config_file.path());
    clear_overrides();
    let config = result.expect("Config should load");

    assert_eq!(config.source.base_url, "http://from-env.example");
    assert_eq!(
        config.storage.database_path,
        Some(PathBuf::from("/var/lib/shows/env.db"))
    );
}

#[test]
#[serial]
fn test_load_config_from_env_without_file() {
    clear_overrides();
    let config = load_config_from_env().expect("Defaults are valid");
    assert_eq!(config.source.base_url, "https://api.tvmaze.com");
    assert_eq!(config.storage.database_path, None);
}

#[test]
#[serial]
fn test_invalid_yaml_is_rejected() {
    clear_overrides();
    let config_file = config_file("source: [this is not: a mapping\n");

    let err = load_config(config_file.path()).unwrap_err();

    assert!(
        err.to_string().contains("Failed to parse config YAML"),
        "unexpected error: {err}"
    );
}

#[test]
#[serial]
fn test_invalid_base_url_names_the_field() {
    clear_overrides();
    let config_file = config_file("source:\n  base_url: \"not a url\"\n");

    let err = load_config(config_file.path()).unwrap_err();

    assert!(
        err.to_string().contains("source.base_url"),
        "unexpected error: {err}"
    );
}

#[test]
#[serial]
fn test_zero_poll_interval_is_rejected() {
    clear_overrides();
    let config_file = config_file("worker:\n  poll_interval_secs: 0\n");

    let err = load_config(config_file.path()).unwrap_err();

    assert!(err.to_string().contains("worker.poll_interval_secs"));
}

#[test]
#[serial]
fn test_missing_file_is_an_error() {
    clear_overrides();
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    clear_overrides();
    let config_file = config_file("storage:\n  database_path: file.db\n");
    env::set_var("SHOWS_DB_PATH", "");
    env::set_var("TVMAZE_API_BASE_URL", "  ");

    let result = load_config(config_file.path());
    clear_overrides();
    let config = result.expect("Config should load");

    assert_eq!(config.storage.database_path, Some(PathBuf::from("file.db")));
    assert_eq!(config.source.base_url, "https://api.tvmaze.com");
}

#[test]
#[serial]
fn test_empty_database_path_in_file_is_rejected() {
    clear_overrides();
    let config_file = config_file("storage:\n  database_path: \"\"\n");

    let err = load_config(config_file.path()).unwrap_err();

    assert!(err.to_string().contains("storage.database_path"));
}
