/// `load_config` module: loads the static YAML run configuration and the access token from the environment.
///
/// This module is the only place where untrusted YAML is parsed into the core [`Config`].
///
/// # Responsibilities
/// - Parse the YAML file; every key is optional and falls back to the defaults of [`Config`]
/// - Reject configurations the pipeline can't run with (no extensions, zero size budget, ...)
/// - Read the `GITHUB_TOKEN` secret for the harvesting stage
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
use anyhow::{bail, Result};
use corpus_harvester_core::config::Config;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable holding the GitHub access token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
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

    let config: Config = if config_content.trim().is_empty() {
        Config::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    validate(&config)?;
    config.trace_loaded();
    Ok(config)
}

/// The configuration to run with: the file at `path`, or the defaults when no file is given.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            let config = Config::default();
            config.trace_loaded();
            Ok(config)
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.extensions.is_empty() {
        bail!("extensions must list at least one file suffix");
    }
    if config.extensions.iter().any(|ext| ext.is_empty()) {
        bail!("extensions must not contain an empty suffix");
    }
    if config.max_file_size_bytes == 0 {
        bail!("max_file_size_bytes must be > 0");
    }
    if config.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be > 0");
    }
    if config.max_entries_per_repo == Some(0) {
        bail!("max_entries_per_repo must be > 0 when set");
    }
    for category in &config.categories {
        let dir = category.dir_name();
        if dir.is_empty() || dir == "." || dir == ".." || dir.contains(|c| c == '/' || c == '\\') {
            bail!("category name {:?} is not a valid directory name", category.name);
        }
        if category.query.trim().is_empty() {
            bail!("category {:?} has an empty query", category.name);
        }
    }
    Ok(())
}

/// Read the access token. Its absence is fatal for harvesting.
pub fn load_token() -> Result<String> {
    match std::env::var(TOKEN_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_VAR} found in env");
            Ok(token)
        }
        Ok(_) => {
            error!("{TOKEN_VAR} environment variable is empty");
            Err(anyhow::anyhow!("{TOKEN_VAR} environment variable is empty"))
        }
        Err(e) => {
            error!(error = ?e, "{TOKEN_VAR} environment variable not set");
            Err(anyhow::anyhow!(
                "{TOKEN_VAR} not found in environment variables: {e}"
            ))
        }
    }
}
