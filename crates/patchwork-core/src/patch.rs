//! Patches: a subgraph presented as a single module.
//!
//! A [`Patch`] with N inlets and M outlets owns N inlet bridges and M outlet
//! bridges, created before any user module so they sit first in the child
//! list. Inlet bridge `k` exposes the patch's external inlet `k` inside the
//! subgraph; outlet bridge `k` collects what the subgraph sends to external
//! outlet `k`. Bridges carry the reserved identifiers `inlet:k` and
//! `outlet:k`, which no user identifier can match.
//!
//! Producing a patch pulls only the outlet bridges, so children that are not
//! reachable from an exposed output never run.

use crate::address::Route;
use crate::error::GraphError;
use crate::graph::{ModuleGraph, NodeId, NodeKind, copy_prefix};
use crate::module::{Inputs, Message, Module, Outputs};

/// A module that wraps an internal [`ModuleGraph`].
pub struct Patch {
    graph: ModuleGraph,
    inlet_bridges: Vec<NodeId>,
    outlet_bridges: Vec<NodeId>,
}

impl Patch {
    /// Creates an empty patch with its bridges.
    pub fn new(inlets: usize, outlets: usize, block_length: usize, sample_rate: f32) -> Self {
        let mut graph = ModuleGraph::new(block_length, sample_rate);
        let inlet_bridges = (0..inlets)
            .map(|k| graph.add_bridge(NodeKind::Inlet(k)))
            .collect();
        let outlet_bridges = (0..outlets)
            .map(|k| graph.add_bridge(NodeKind::Outlet(k)))
            .collect();
        Self {
            graph,
            inlet_bridges,
            outlet_bridges,
        }
    }

    /// Reserved identifier of inlet bridge `k`.
    pub fn inlet_identifier(k: usize) -> String {
        format!("inlet:{k}")
    }

    /// Reserved identifier of outlet bridge `k`.
    pub fn outlet_identifier(k: usize) -> String {
        format!("outlet:{k}")
    }

    /// Adds a child module.
    pub fn add(
        &mut self,
        identifier: impl Into<String>,
        module: Box<dyn Module>,
    ) -> Result<NodeId, GraphError> {
        self.graph.add_module(identifier, module)
    }

    /// Removes and releases a child module. Bridges cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        if self.graph.module(id).is_none() {
            return Err(GraphError::ModuleNotFound(id));
        }
        self.graph.remove(id)
    }

    /// Node of inlet bridge `k`. Its single outlet carries external inlet `k`.
    pub fn inlet_bridge(&self, k: usize) -> Option<NodeId> {
        self.inlet_bridges.get(k).copied()
    }

    /// Node of outlet bridge `k`. Its single inlet feeds external outlet `k`.
    pub fn outlet_bridge(&self, k: usize) -> Option<NodeId> {
        self.outlet_bridges.get(k).copied()
    }

    /// Connects two children (bridges included). See [`ModuleGraph::connect`].
    pub fn connect(&mut self, from: NodeId, outlet: usize, to: NodeId, inlet: usize) -> bool {
        self.graph.connect(from, outlet, to, inlet)
    }

    /// Disconnects two children. See [`ModuleGraph::disconnect`].
    pub fn disconnect(&mut self, from: NodeId, outlet: usize, to: NodeId, inlet: usize) -> bool {
        self.graph.disconnect(from, outlet, to, inlet)
    }

    /// First child with the given identifier, bridges included.
    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        self.graph.find(identifier)
    }

    /// The internal graph.
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Mutable access to the internal graph.
    pub fn graph_mut(&mut self) -> &mut ModuleGraph {
        &mut self.graph
    }

    /// Samples per block.
    pub fn block_length(&self) -> usize {
        self.graph.block_length()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }
}

impl Module for Patch {
    fn inlet_count(&self) -> usize {
        self.inlet_bridges.len()
    }

    fn outlet_count(&self) -> usize {
        self.outlet_bridges.len()
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, timestamp: u64) {
        for (k, &bridge) in self.inlet_bridges.iter().enumerate() {
            if let Some(port) = self.graph.outlet_mut(bridge, 0) {
                copy_prefix(port.buffer_mut(), inputs.get(k));
            }
        }

        self.graph.prepare_all();
        for &bridge in &self.outlet_bridges {
            self.graph.produce(bridge, timestamp);
        }

        for (k, &bridge) in self.outlet_bridges.iter().enumerate() {
            if let Some(port) = self.graph.inlet(bridge, 0) {
                copy_prefix(outputs.get_mut(k), port.buffer());
            }
        }
    }

    fn send_message(&mut self, route: Route<'_>, message: &Message) -> bool {
        self.graph.send_message(route, message)
    }

    fn release(&mut self) {
        self.graph.release();
    }
}
