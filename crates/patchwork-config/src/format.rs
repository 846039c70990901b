//! File format dispatch by extension.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json` and anything unrecognised.
    Json,
    /// `.toml`
    Toml,
}

impl Format {
    /// Picks the format from the path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }

    /// Parses `content` in this format.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => toml::from_str(content)?,
        })
    }

    /// Renders `value` in this format.
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?,
            Format::Toml => toml::to_string_pretty(value)?,
        })
    }
}

/// Reads and parses a file, choosing the format by extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    Format::from_path(path).parse(&content)
}

/// Serializes and writes a file, choosing the format by extension.
pub fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let content = Format::from_path(path).render(value)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}
