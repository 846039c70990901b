//! Module registry and dynamic construction for patchwork.
//!
//! A [`Registry`] maps names to module factories, voice factories and wave
//! tables. [`build_patch`] turns a [`PatchDescriptor`](patchwork_config::PatchDescriptor)
//! into a live [`Patch`](patchwork_core::Patch); [`build_script`] wraps a
//! whole [`Script`](patchwork_config::Script) in an
//! [`Engine`](patchwork_core::Engine).
//!
//! # Built-ins
//!
//! | Kind | Names |
//! |------|-------|
//! | Modules | `osc`, `square`, `adsr`, `delay`, `allpass`, `patch`, `poly`, `granulator` |
//! | Voices | `sine`, `patch` (also as `sinvoice`, `patchvoice`) |
//! | Tables | `sine` |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use patchwork_config::Script;
//! use patchwork_registry::{Registry, build_script};
//!
//! let script = Script::from_json(r#"{
//!     "sampleRate": 8000,
//!     "bufferLength": 64,
//!     "patch": {
//!         "numOutlets": 1,
//!         "modules": { "osc": { "type": "osc", "settings": { "frequency": 440 } } },
//!         "connections": [ { "from": "osc", "to": "outlet:0" } ]
//!     }
//! }"#).unwrap();
//!
//! let registry = Arc::new(Registry::with_builtins());
//! let mut engine = build_script(&script, &registry).unwrap();
//! engine.process_block();
//! assert!(engine.outlet(0).iter().any(|&s| s != 0.0));
//! ```

mod build;
mod builtins;
mod error;
mod patch_voice;
mod registry;

pub use build::{build_patch, build_script};
pub use builtins::PolySettings;
pub use error::BuildError;
pub use patch_voice::{PatchNote, PatchVoice};
pub use registry::{BuildContext, EntryInfo, ModuleFactory, Registry, VoiceFactoryBuilder};
