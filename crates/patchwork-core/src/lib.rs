//! Patchwork Core - module graph engine for block-based audio synthesis
//!
//! This crate provides the dataflow engine: modules connected port to port,
//! pulled block by block from the outputs that are actually needed.
//!
//! # Core Abstractions
//!
//! ## Modules and Graphs
//!
//! - [`Module`] - Object-safe trait every processing unit implements
//! - [`ModuleGraph`] - Arena of modules, their ports and connections, plus the
//!   cycle-safe pull scheduler
//! - [`Patch`] - A subgraph presented as one module through inlet and outlet
//!   bridges
//! - [`Engine`] - Root host that drives one module and keeps the clock
//!
//! ## Addressing
//!
//! - [`Address`] - Slash-delimited path such as `voices/p1/osc1`, routed to a
//!   nested module by identifier
//!
//! ## Pools
//!
//! - [`PolyVoice`] - Polyphonic voice pool with trigger/finish lifecycle
//! - [`Granulator`] - Sample-accurate grain scheduler
//!
//! ## Control
//!
//! - [`Score`] / [`ScorePlayer`] - Timed messages quantized to block starts
//! - [`WaveTable`] - Shared single-cycle waveforms
//!
//! # Example
//!
//! ```rust
//! use patchwork_core::{Engine, Inputs, Module, Outputs, Patch};
//!
//! struct Dc(f32);
//!
//! impl Module for Dc {
//!     fn inlet_count(&self) -> usize { 0 }
//!     fn outlet_count(&self) -> usize { 1 }
//!     fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
//!         outputs.fill(self.0);
//!     }
//! }
//!
//! let mut patch = Patch::new(0, 1, 64, 44100.0);
//! let dc = patch.add("dc", Box::new(Dc(0.5))).unwrap();
//! let out = patch.outlet_bridge(0).unwrap();
//! patch.connect(dc, 0, out, 0);
//!
//! let mut engine = Engine::new("main", Box::new(patch), 64, 44100.0).unwrap();
//! engine.process_block();
//! assert!(engine.outlet(0).iter().all(|&s| s == 0.5));
//! ```
//!
//! # Design Principles
//!
//! - **No allocation while pulling**: port buffers are sized once, when a
//!   module joins a graph
//! - **Cycles are legal**: feedback edges read the previous block
//! - **Tolerant topology**: bad ports and unknown names are no-ops, not errors

pub mod address;
pub mod engine;
pub mod error;
pub mod graph;
pub mod module;
pub mod patch;
pub mod pool;
pub mod score;
pub mod wavetable;

// Re-export main types at crate root
pub use address::{Address, Route};
pub use engine::Engine;
pub use error::{AddressError, GraphError};
pub use graph::{
    Connection, ModuleGraph, NodeId, Port, accumulate, copy_prefix, is_valid_identifier,
};
pub use module::{Inputs, Message, Module, Outputs, Settings, Voice};
pub use patch::Patch;
pub use pool::{
    ConstantDuration, ConstantParameters, DurationGenerator, Grain, GrainFactory, Granulator,
    ParameterGenerator, PeriodicTicks, PolyVoice, TickGenerator, VoiceFactory,
};
pub use score::{Score, ScoreAction, ScoreEvent, ScorePlayer};
pub use wavetable::WaveTable;
