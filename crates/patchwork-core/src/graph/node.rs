//! Graph node types.
//!
//! Each node in a [`ModuleGraph`](super::ModuleGraph) has a [`NodeId`] and a
//! [`NodeKind`]: either a user module or one of the two boundary bridges a
//! [`Patch`](crate::Patch) uses to expose its external ports. The `NodeData`
//! struct bundles the kind with the bookkeeping the scheduler needs.

use crate::module::Module;

use super::port::Port;

/// Unique identifier for a node in a module graph.
///
/// Node IDs are assigned sequentially and never reused within a graph
/// instance, so a stale ID never aliases a newer module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The role of a node in the graph.
pub(crate) enum NodeKind {
    /// Boundary node exposing external inlet `k` through its single outlet.
    /// The owner stages the outlet buffer before the cycle is pulled.
    Inlet(usize),
    /// Boundary node collecting external outlet `k` on its single inlet.
    /// The owner reads the summed inlet buffer after the cycle is pulled.
    Outlet(usize),
    /// A processing module.
    Module(Box<dyn Module>),
}

/// Internal bookkeeping for a node in the graph.
pub(crate) struct NodeData {
    pub identifier: String,
    pub kind: NodeKind,
    pub inlets: Vec<Port>,
    pub outlets: Vec<Port>,
    /// Set once the node has been produced for the current cycle.
    pub processed: bool,
}

impl NodeData {
    pub fn new(identifier: String, kind: NodeKind, block_length: usize) -> Self {
        let (inlets, outlets) = match &kind {
            NodeKind::Inlet(_) => (0, 1),
            NodeKind::Outlet(_) => (1, 0),
            NodeKind::Module(module) => (module.inlet_count(), module.outlet_count()),
        };
        Self {
            identifier,
            kind,
            inlets: (0..inlets).map(|_| Port::new(block_length)).collect(),
            outlets: (0..outlets).map(|_| Port::new(block_length)).collect(),
            processed: false,
        }
    }

    pub fn clear_connections(&mut self) {
        for port in self.inlets.iter_mut().chain(self.outlets.iter_mut()) {
            port.clear_connections();
        }
    }
}
