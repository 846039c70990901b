//! Errors raised while turning descriptions into modules.

use patchwork_config::ConfigError;
use patchwork_core::GraphError;
use thiserror::Error;

/// Errors that can occur while building modules, patches or scripts.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No module factory under this name
    #[error("unknown module type: {0}")]
    UnknownFactory(String),

    /// No voice factory under this name
    #[error("unknown voice factory: {0}")]
    UnknownVoiceFactory(String),

    /// No wave table under this name
    #[error("unknown wave table: {0}")]
    UnknownWaveTable(String),

    /// Settings did not decode for the factory
    #[error("invalid settings for '{factory}': {source}")]
    InvalidSettings {
        /// Factory name.
        factory: String,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// Structural graph failure, such as an invalid identifier
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A referenced file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// Create an invalid settings error.
    pub fn invalid_settings(factory: impl Into<String>, source: serde_json::Error) -> Self {
        BuildError::InvalidSettings {
            factory: factory.into(),
            source,
        }
    }
}
