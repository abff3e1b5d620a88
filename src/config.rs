//! Profile configuration module
//!
//! Loads a [`ConnectionProfile`] from an optional TOML file layered under
//! `HIGHGO_*` environment variables, then validates it.

use crate::error::ConnectorError;
use crate::profile::ConnectionProfile;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the profile file
pub const PROFILE_ENV: &str = "HIGHGO_PROFILE";

/// Profile file used when `HIGHGO_PROFILE` is not set
pub const DEFAULT_PROFILE_PATH: &str = "highgo.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid profile: {0}")]
    Invalid(#[from] ConnectorError),
}

/// Loaded settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub profile: ConnectionProfile,
    pub profile_path: PathBuf,
}

impl Settings {
    /// Load settings from `.env`, the profile file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let path = std::env::var(PROFILE_ENV).unwrap_or_else(|_| DEFAULT_PROFILE_PATH.to_string());
        Self::from_sources(Path::new(&path), environment())
    }

    /// Load from `path` and the given environment source
    pub fn from_sources(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        debug!("Loading profile from {} and HIGHGO_* variables", path.display());

        let profile: ConnectionProfile = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        profile.check()?;

        Ok(Self {
            profile,
            profile_path: path.to_path_buf(),
        })
    }
}

/// `HIGHGO_HOSTNAME`, `HIGHGO_DATABASE_NAME`, `HIGHGO_USE_SSL`, ...
pub fn environment() -> Environment {
    Environment::with_prefix("HIGHGO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
