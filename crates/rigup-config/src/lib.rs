//! Configuration and stored credentials for rigup
//!
//! Credentials the operator has entered once (cloud token, source-host
//! tokens, the public key authorized on deployed machines) are kept in a YAML
//! file under the platform config directory so later deployments do not
//! re-prompt for them.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CREDENTIALS_FILE: &str = "credentials.yml";

/// rigup's configuration directory, created on first use.
///
/// `RIGUP_CONFIG_DIR` overrides the platform default; tests rely on this.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match std::env::var_os("RIGUP_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join("rigup"),
    };

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Credentials persisted between runs. Every field is optional; the deploy
/// flow prompts for whatever is missing and offers to save it back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digitalocean_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket_app_password: Option<String>,

    /// Public key granted login on every machine this operator deploys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl StoredCredentials {
    /// Load stored credentials, returning defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let path = credentials_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Invalid {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = credentials_path()?;
        let text = serde_yaml::to_string(self).map_err(|e| ConfigError::Invalid {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|e| ConfigError::Write {
            path,
            message: e.to_string(),
        })
    }
}

fn credentials_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CREDENTIALS_FILE))
}
