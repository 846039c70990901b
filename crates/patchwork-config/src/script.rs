//! The main script: engine settings plus the root patch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::{Format, read_file, write_file};
use crate::patch::PatchDescriptor;

/// A runnable patch with its sample rate and block length.
///
/// # TOML Format
///
/// ```toml
/// sampleRate = 44100
/// bufferLength = 512
///
/// [patch]
/// numOutlets = 2
///
/// [patch.modules.poly]
/// type = "poly"
/// settings = { factory = "sine" }
///
/// [[patch.connections]]
/// from = "poly"
/// to = "outlet:0"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Sample rate in Hz (default 44100).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,
    /// Samples per block (default 512).
    #[serde(default = "default_buffer_length")]
    pub buffer_length: usize,
    /// The root patch.
    pub patch: PatchDescriptor,
    /// Directory the script was loaded from.
    #[serde(skip)]
    directory: Option<PathBuf>,
}

fn default_sample_rate() -> f32 {
    44100.0
}

fn default_buffer_length() -> usize {
    512
}

impl Script {
    /// Script running `patch` at the default rate and block length.
    pub fn new(patch: PatchDescriptor) -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_length: default_buffer_length(),
            patch,
            directory: None,
        }
    }

    /// Sets the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the block length.
    pub fn with_buffer_length(mut self, buffer_length: usize) -> Self {
        self.buffer_length = buffer_length;
        self
    }

    /// Loads a script, TOML for `.toml` files and JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut script: Script = read_file(path)?;
        script.directory = path.parent().map(Path::to_path_buf);
        script.validate()?;
        tracing::debug!(
            path = %path.display(),
            sample_rate = script.sample_rate,
            buffer_length = script.buffer_length,
            modules = script.patch.modules.len(),
            "loaded script"
        );
        Ok(script)
    }

    /// Parses a JSON script.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let script: Script = Format::Json.parse(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Parses a TOML script.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let script: Script = Format::Toml.parse(toml)?;
        script.validate()?;
        Ok(script)
    }

    /// Writes the script in the format matching the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_file(path.as_ref(), self)
    }

    /// Directory relative patch paths resolve against.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidScript(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.buffer_length == 0 {
            return Err(ConfigError::InvalidScript(
                "buffer length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
