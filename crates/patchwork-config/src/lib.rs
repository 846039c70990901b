//! File formats for patchwork.
//!
//! - [`PatchDescriptor`] - modules by identifier plus their connections
//! - [`Script`] - sample rate, block length and the root patch
//! - [`ScoreFile`] / [`load_score`] - timed messages for a running engine
//!
//! Files ending in `.toml` are read and written as TOML; everything else is
//! JSON. Settings and message payloads stay schema-less
//! ([`patchwork_core::Settings`]) until a factory decodes them.
//!
//! # Example
//!
//! ```rust
//! use patchwork_config::{ConnectionDescriptor, ModuleDescriptor, PatchDescriptor, Script};
//! use serde_json::json;
//!
//! let patch = PatchDescriptor::new(0, 1)
//!     .with_module("osc", ModuleDescriptor::new("osc").with_settings(json!({"frequency": 220})))
//!     .with_connection(ConnectionDescriptor::new("osc", 0, "outlet:0", 0));
//! let script = Script::new(patch).with_sample_rate(48000.0);
//! assert_eq!(script.patch.modules.len(), 1);
//! ```

mod error;
mod format;
mod patch;
mod score;
mod script;

pub use error::ConfigError;
pub use format::{Format, read_file, write_file};
pub use patch::{ConnectionDescriptor, LoadedPatch, ModuleDescriptor, PatchDescriptor, PatchSource};
pub use score::{ActionKind, ScoreEventDescriptor, ScoreFile, load_score};
pub use script::Script;
