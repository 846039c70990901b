//! Module graph arena and pull scheduler.
//!
//! A [`ModuleGraph`] owns its modules and stores connections as mirrored
//! records of [`NodeId`]s, so arbitrary feedback cycles are allowed without
//! creating ownership cycles.
//!
//! # Cycle
//!
//! Each block the owner clears the per-node `processed` flags
//! ([`prepare_all()`](ModuleGraph::prepare_all)) and then pulls the nodes it
//! needs ([`produce()`](ModuleGraph::produce)). Pulling a node first fills its
//! inlets by recursively producing every upstream module and summing their
//! outlets, then runs the node's own [`Module::process`](crate::Module::process).
//! Modules that no pulled node depends on do no work.
//!
//! # Example
//!
//! ```rust,ignore
//! use patchwork_core::ModuleGraph;
//!
//! let mut graph = ModuleGraph::new(512, 44100.0);
//! let osc = graph.add_module("osc", Box::new(my_osc))?;
//! let amp = graph.add_module("amp", Box::new(my_amp))?;
//! graph.connect(osc, 0, amp, 0);
//!
//! graph.prepare_all();
//! graph.produce(amp, 0);
//! let block = graph.outlet(amp, 0).unwrap().buffer();
//! ```

pub mod node;
pub mod port;
mod processing;

pub use node::NodeId;
pub(crate) use node::NodeKind;
pub use port::{Connection, Port, accumulate, copy_prefix};
pub use processing::{ModuleGraph, is_valid_identifier};
