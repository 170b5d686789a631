//! Configuration types and loading
//!
//! Precedence: CLI flags > env vars > config file > defaults.
//! Credentials never live here; they come from the `AWS_*` environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const DEFAULT_CONFIG_FILE: &str = "atmosphere.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub acquire: AcquireConfig,
}

/// Where the allocation service lives and how requests are signed
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_signing_service")]
    pub signing_service: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            signing_service: default_signing_service(),
        }
    }
}

/// Defaults for `acquire`
#[derive(Debug, Deserialize)]
pub struct AcquireConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_signing_service() -> String {
    atmosphere_auth::signer::DEFAULT_SERVICE.into()
}

fn default_timeout() -> u64 {
    atmosphere_client::DEFAULT_ACQUIRE_TIMEOUT_SECS
}

/// A config path and whether the user asked for it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: PathBuf,
    pub explicit: bool,
}

impl Config {
    /// Load from a TOML file (if present), then overlay environment variables.
    ///
    /// A missing file is only an error when the path was given explicitly.
    pub fn load(location: &ConfigPath) -> Result<Self> {
        let mut config = if location.path.exists() || location.explicit {
            Self::from_file(&location.path)?
        } else {
            Config::default()
        };

        if let Ok(endpoint) = std::env::var("ATMOSPHERE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                config.service.endpoint = Some(endpoint.trim().to_owned());
            }
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            if !region.trim().is_empty() {
                config.service.region = region.trim().to_owned();
            }
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check the merged configuration and return the endpoint.
    pub fn validate(&self) -> Result<&str> {
        let endpoint = self.service.endpoint.as_deref().ok_or_else(|| {
            Error::Config(
                "endpoint is required (set [service].endpoint, ATMOSPHERE_ENDPOINT or --endpoint)"
                    .into(),
            )
        })?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "endpoint must start with http:// or https://, got: {endpoint}"
            )));
        }
        if self.service.region.is_empty() {
            return Err(Error::Config("region must not be empty".into()));
        }
        if self.acquire.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }
        Ok(endpoint)
    }

    /// Resolve the config path from the CLI flag or the ATMOSPHERE_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> ConfigPath {
        if let Some(p) = cli_path {
            return ConfigPath {
                path: PathBuf::from(p),
                explicit: true,
            };
        }
        if let Ok(p) = std::env::var("ATMOSPHERE_CONFIG") {
            return ConfigPath {
                path: PathBuf::from(p),
                explicit: true,
            };
        }
        ConfigPath {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            explicit: false,
        }
    }
}
