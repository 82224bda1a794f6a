//! Configuration file discovery and validation for the CLI.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use trellis::{
    TrellisError,
    config::{AppConfig, EngineConfig},
};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for TrellisError {
    fn from(err: ConfigError) -> Self {
        TrellisError::Config(err.to_string())
    }
}

/// Configuration looked up relative to the working directory.
const LOCAL_CONFIG: &str = "trellis/config.toml";

/// Finds and loads the configuration for a run.
///
/// An explicit path must exist. Without one, [`LOCAL_CONFIG`] and then
/// `config.toml` in the platform config directory are tried, and the
/// built-in defaults apply when neither exists.
///
/// # Errors
///
/// Returns [`TrellisError::Config`] for a missing explicit file or a file
/// that fails to parse or validate.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, TrellisError> {
    if let Some(path) = explicit_path {
        return load_config_file(path.as_ref());
    }

    let platform = ProjectDirs::from("com", "trellis", "trellis")
        .map(|dirs| dirs.config_dir().join("config.toml"));
    let found = std::iter::once(PathBuf::from(LOCAL_CONFIG))
        .chain(platform)
        .find(|candidate| {
            let exists = candidate.exists();
            if !exists {
                debug!(path = candidate.display().to_string(); "No configuration file here");
            }
            exists
        });

    match found {
        Some(path) => load_config_file(&path),
        None => {
            debug!("Using the built-in configuration");
            Ok(AppConfig::default())
        }
    }
}

fn load_config_file(path: &Path) -> Result<AppConfig, TrellisError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    info!(path = path.display().to_string(); "Loading configuration");
    let content = fs::read_to_string(path).map_err(|err| TrellisError::io(path, err))?;
    parse_config(&content).map_err(Into::into)
}

/// Parse and validate configuration text
fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    match config.engine() {
        EngineConfig::Process(process) if process.program().trim().is_empty() => Err(
            ConfigError::Validation("engine.program must not be empty".to_string()),
        ),
        _ => Ok(()),
    }
}
