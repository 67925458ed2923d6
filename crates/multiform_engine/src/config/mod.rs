//! Configuration file handling
//!
//! Config types derive serde and opt into [`ConfigFile`] to gain
//! format-dispatched load/save over TOML and RON.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file did not parse
    #[error("parse error in {path}: {message}")]
    Parse {
        /// The offending file
        path: String,
        /// What the parser reported
        message: String,
    },

    /// Config value did not serialize
    #[error("serialization error: {0}")]
    Serialize(String),

    /// File extension maps to no known format
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`)
    Toml,
    /// RON (`.ron`)
    Ron,
}

impl ConfigFormat {
    /// Derive the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loadable and savable configuration
pub trait ConfigFile: Serialize + DeserializeOwned + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        let parse_error = |message: String| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        };
        match format {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|err| parse_error(err.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|err| parse_error(err.to_string()))
            }
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|err| ConfigError::Serialize(err.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|err| ConfigError::Serialize(err.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load configuration, falling back to defaults on any failure
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "using default config, could not load {}: {}",
                    path.as_ref().display(),
                    err
                );
                Self::default()
            }
        }
    }
}
