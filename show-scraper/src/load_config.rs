/// `load_config` module: Loads a YAML config file, applies environment overrides and validates it into a [`ScraperConfig`].
///
/// This module is the only place where untrusted YAML is parsed and mapped to the typed configuration of the core crate.
///
/// # Responsibilities
/// - Parse user-supplied YAML configuration files into [`ScraperConfig`]; omitted sections and keys take their defaults
/// - Apply environment overrides for deployment-specific values (`TVMAZE_API_BASE_URL`, `SHOWS_DB_PATH`)
/// - Reject invalid values before any worker is built, with the offending key in the message
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
use anyhow::Result;
use show_scraper_core::config::ScraperConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const BASE_URL_ENV: &str = "TVMAZE_API_BASE_URL";
pub const DB_PATH_ENV: &str = "SHOWS_DB_PATH";

/// Loads a YAML config file, then applies environment overrides and validation.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ScraperConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: ScraperConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    finalize(config)
}

/// Defaults plus environment overrides, for running without a config file.
pub fn load_config_from_env() -> Result<ScraperConfig> {
    info!("No config file given, using defaults and environment");
    finalize(ScraperConfig::default())
}

fn finalize(mut config: ScraperConfig) -> Result<ScraperConfig> {
    apply_env_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Invalid configuration: {e}"));
    }
    config.trace_loaded();
    Ok(config)
}

fn apply_env_overrides(config: &mut ScraperConfig) {
    if let Some(base_url) = env_override(BASE_URL_ENV) {
        info!(env = BASE_URL_ENV, base_url = %base_url, "Overriding source.base_url from environment");
        config.source.base_url = base_url;
    }
    if let Some(db_path) = env_override(DB_PATH_ENV) {
        info!(env = DB_PATH_ENV, database_path = %db_path, "Overriding storage.database_path from environment");
        config.storage.database_path = Some(PathBuf::from(db_path));
    }
}

/// A variable that is unset or blank leaves the file value in place.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
