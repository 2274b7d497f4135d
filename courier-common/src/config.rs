//! TOML configuration loading shared by the courier crates.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Parse configuration from a TOML string.
///
/// # Errors
/// If the input is not valid TOML or does not match `T`.
pub fn from_toml_str<T: DeserializeOwned>(input: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(input)?)
}

/// Read and parse a TOML configuration file.
///
/// # Errors
/// If the file cannot be read or does not parse as `T`.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    from_toml_str(&contents)
}
