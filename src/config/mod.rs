//! Configuration for nuresolve.
//!
//! Configuration is optional: every setting has a default, and a missing file
//! means defaults throughout.
//!
//! # Location
//!
//! The first of these that applies is used:
//!
//! 1. the path given with `--config` (must exist)
//! 2. the path in the `NURESOLVE_CONFIG` environment variable
//! 3. `~/.nuresolve/config.toml`
//!
//! # Format
//!
//! ```toml
//! [resolver]
//! max_concurrency = 8        # in-flight provider calls per framework pass
//! strict_frameworks = true   # unknown monikers in requests are errors
//!
//! [rules]
//! disabled = ["NU5105"]              # rules removed by code
//! warnings_as_errors = ["NU5100"]    # warning codes reported as errors
//!
//! # Extra compatibility: net6.0+ projects may consume net472 assets
//! [[frameworks.mappings]]
//! target = "net6.0"
//! supported = "net472"
//! steps = 3
//! ```

pub mod parser;

pub use parser::{parse_config, parse_config_str};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_MAX_CONCURRENCY};
use crate::framework::{CompatibilityMapping, CompatibilityTable};
use crate::report::LogCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failures while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file: {}", path.display())]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML
    #[error("Failed to parse config file: {}", path.display())]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// An explicitly requested file does not exist
    #[error("Config file not found: {}", path.display())]
    NotFound {
        /// Requested path
        path: PathBuf,
    },
}

/// `[resolver]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Bound on in-flight provider calls per framework pass
    pub max_concurrency: usize,
    /// Reject unknown framework monikers in requests instead of treating them
    /// as unsupported
    pub strict_frameworks: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            strict_frameworks: true,
        }
    }
}

/// `[rules]` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Rule codes that are not run
    pub disabled: Vec<LogCode>,
    /// Warning codes promoted to errors
    pub warnings_as_errors: Vec<LogCode>,
}

/// `[frameworks]` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    /// Mappings appended to the built-in compatibility table
    pub mappings: Vec<CompatibilityMapping>,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolver settings
    pub resolver: ResolverSettings,
    /// Package rule settings
    pub rules: RuleSettings,
    /// Framework compatibility settings
    pub frameworks: FrameworkSettings,
}

impl Config {
    /// Loads configuration from the first applicable location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when `explicit` names a missing file,
    /// and read or parse errors for a file that exists but is invalid.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_value = std::env::var(CONFIG_ENV_VAR).ok();
        let Some(path) = Self::locate(explicit, env_value.as_deref(), dirs::home_dir()) else {
            debug!("No configuration location available, using defaults");
            return Ok(Self::default());
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            if explicit.is_some() {
                return Err(ConfigError::NotFound { path });
            }
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path).await
    }

    /// Reads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse_config_str(path, &content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Picks the configuration path: `explicit`, then the environment value,
    /// then the file under `home`.
    #[must_use]
    pub fn locate(
        explicit: Option<&Path>,
        env_value: Option<&str>,
        home: Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
            return Some(PathBuf::from(value));
        }
        home.map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// The built-in compatibility table plus the configured mappings.
    #[must_use]
    pub fn compatibility_table(&self) -> CompatibilityTable {
        CompatibilityTable::standard().with_mappings(self.frameworks.mappings.iter().cloned())
    }
}
