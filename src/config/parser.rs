//! TOML parsing with file path context.

use super::ConfigError;
use std::path::Path;

/// Reads and deserializes a TOML file.
///
/// # Examples
///
/// ```rust,no_run
/// use nuresolve_cli::config::{Config, parse_config};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: Config = parse_config(Path::new("nuresolve.toml"))?;
/// println!("max concurrency: {}", config.resolver.max_concurrency);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::Read`] when the file cannot be read and
/// [`ConfigError::Parse`] when its content does not match `T`.
pub fn parse_config<T>(path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(path, &content)
}

/// Deserializes TOML `content` that was read from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the content does not match `T`.
pub fn parse_config_str<T>(path: &Path, content: &str) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
