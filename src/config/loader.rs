//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{AuthCredential, SdkConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Auth file error: {0}")]
    AuthFile(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
///
/// A relative `auth_file` is resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<SdkConfig, ConfigError> {
    let content = read(path)?;
    let mut config: SdkConfig = toml::from_str(&content)?;

    if config.auth.is_empty() {
        if let Some(auth_file) = &config.auth_file {
            let auth_path = match path.parent() {
                Some(dir) if Path::new(auth_file).is_relative() => dir.join(auth_file),
                _ => PathBuf::from(auth_file),
            };
            config.auth = load_auth(&auth_path)?;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        path = %path.display(),
        host = %config.gateway.host,
        namespace = %config.gateway.namespace,
        authenticated = config.auth.is_complete(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Load a credential from a JSON file with keys `chainid`, `id`, `key`.
pub fn load_auth(path: &Path) -> Result<AuthCredential, ConfigError> {
    let content = read(path)?;
    Ok(serde_json::from_str(&content)?)
}
