//! Declarative patch descriptions.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "numInlets": 0,
//!   "numOutlets": 1,
//!   "modules": {
//!     "osc1": { "type": "osc", "settings": { "frequency": 220 } }
//!   },
//!   "connections": [
//!     { "from": "osc1", "outlet": 0, "to": "outlet:0", "inlet": 0 }
//!   ]
//! }
//! ```
//!
//! Bridges are addressed as `inlet:k` and `outlet:k` in connections.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use patchwork_core::Settings;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::read_file;

/// One module of a patch: a registry factory name plus its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Registry factory name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Factory settings; `null` selects the defaults.
    #[serde(default, skip_serializing_if = "Settings::is_null")]
    pub settings: Settings,
}

impl ModuleDescriptor {
    /// Module of `kind` with default settings.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            settings: Settings::Null,
        }
    }

    /// Sets the factory settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

/// An edge from `from`'s outlet to `to`'s inlet, by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Source module identifier.
    pub from: String,
    /// Source outlet index.
    #[serde(default)]
    pub outlet: usize,
    /// Destination module identifier.
    pub to: String,
    /// Destination inlet index.
    #[serde(default)]
    pub inlet: usize,
}

impl ConnectionDescriptor {
    /// Connection between two named ports.
    pub fn new(
        from: impl Into<String>,
        outlet: usize,
        to: impl Into<String>,
        inlet: usize,
    ) -> Self {
        Self {
            from: from.into(),
            outlet,
            to: to.into(),
            inlet,
        }
    }
}

/// A patch: bridge counts, named modules and their connections.
///
/// Modules are kept in identifier order so construction is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchDescriptor {
    /// Number of inlet bridges.
    pub num_inlets: usize,
    /// Number of outlet bridges.
    pub num_outlets: usize,
    /// Modules by identifier.
    pub modules: BTreeMap<String, ModuleDescriptor>,
    /// Edges between modules and bridges.
    pub connections: Vec<ConnectionDescriptor>,
}

impl PatchDescriptor {
    /// Empty patch with the given bridge counts.
    pub fn new(num_inlets: usize, num_outlets: usize) -> Self {
        Self {
            num_inlets,
            num_outlets,
            ..Self::default()
        }
    }

    /// Adds (or replaces) a module.
    pub fn with_module(mut self, id: impl Into<String>, module: ModuleDescriptor) -> Self {
        self.modules.insert(id.into(), module);
        self
    }

    /// Adds a connection.
    pub fn with_connection(mut self, connection: ConnectionDescriptor) -> Self {
        self.connections.push(connection);
        self
    }

    /// Loads a patch file. A file holding a whole script yields its patch.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading patch");
        let file: PatchFile = read_file(path)?;
        Ok(file.patch.unwrap_or(file.bare))
    }
}

/// Either a script (with a `patch` key) or a bare patch descriptor.
#[derive(Deserialize)]
struct PatchFile {
    #[serde(default)]
    patch: Option<PatchDescriptor>,
    #[serde(flatten)]
    bare: PatchDescriptor,
}

/// Where a nested patch comes from: inline or a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchSource {
    /// Path to a patch or script file.
    Path(PathBuf),
    /// Descriptor written in place.
    Inline(Box<PatchDescriptor>),
}

/// A resolved patch and the directory its relative paths resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPatch {
    /// The patch.
    pub descriptor: PatchDescriptor,
    /// Directory of the file it came from, if any.
    pub directory: Option<PathBuf>,
}

impl PatchSource {
    /// Produces the descriptor, reading the file for path sources.
    ///
    /// Relative paths are joined to `base`. Inline descriptors inherit
    /// `base` as their own directory.
    pub fn resolve(&self, base: Option<&Path>) -> Result<LoadedPatch, ConfigError> {
        match self {
            PatchSource::Inline(descriptor) => Ok(LoadedPatch {
                descriptor: descriptor.as_ref().clone(),
                directory: base.map(Path::to_path_buf),
            }),
            PatchSource::Path(path) => {
                let full = match base {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.clone(),
                };
                let descriptor = PatchDescriptor::load(&full)?;
                Ok(LoadedPatch {
                    descriptor,
                    directory: full.parent().map(Path::to_path_buf),
                })
            }
        }
    }
}
