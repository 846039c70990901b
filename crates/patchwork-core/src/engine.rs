//! Root host that drives a single top-level module block by block.

use crate::address::{Address, Route};
use crate::error::{AddressError, GraphError};
use crate::graph::{ModuleGraph, NodeId, NodeKind};
use crate::module::{Message, Module};

/// Owns the top-level module and the clock that advances it.
///
/// The root sits in a private host graph next to one inlet bridge per root
/// inlet, so callers can feed external signal through
/// [`input_mut()`](Self::input_mut) before each block.
///
/// # Example
///
/// ```rust
/// use patchwork_core::{Engine, Patch};
///
/// let patch = Patch::new(0, 1, 64, 48000.0);
/// let mut engine = Engine::new("main", Box::new(patch), 64, 48000.0).unwrap();
/// engine.process_block();
/// assert_eq!(engine.outlet(0).len(), 64);
/// assert_eq!(engine.timestamp(), 64);
/// ```
pub struct Engine {
    graph: ModuleGraph,
    root: NodeId,
    inputs: Vec<NodeId>,
    timestamp: u64,
}

impl Engine {
    /// Places `root` in a new host.
    pub fn new(
        identifier: impl Into<String>,
        root: Box<dyn Module>,
        block_length: usize,
        sample_rate: f32,
    ) -> Result<Self, GraphError> {
        let mut graph = ModuleGraph::new(block_length, sample_rate);
        let inlet_count = root.inlet_count();
        let root = graph.add_module(identifier, root)?;
        let inputs = (0..inlet_count)
            .map(|k| {
                let bridge = graph.add_bridge(NodeKind::Inlet(k));
                graph.connect(bridge, 0, root, k);
                bridge
            })
            .collect();
        Ok(Self {
            graph,
            root,
            inputs,
            timestamp: 0,
        })
    }

    /// Produces one block and advances the clock.
    pub fn process_block(&mut self) {
        self.graph.prepare_all();
        self.graph.produce(self.root, self.timestamp);
        self.timestamp += self.graph.block_length() as u64;
    }

    /// Root outlet `k` as of the last block. Empty when out of range.
    pub fn outlet(&self, k: usize) -> &[f32] {
        self.graph
            .outlet(self.root, k)
            .map(|port| port.buffer())
            .unwrap_or_default()
    }

    /// Buffer feeding root inlet `k` on the next block.
    pub fn input_mut(&mut self, k: usize) -> Option<&mut [f32]> {
        let bridge = *self.inputs.get(k)?;
        self.graph
            .outlet_mut(bridge, 0)
            .map(|port| port.buffer_mut())
    }

    /// Parses `path` and routes `message` into the root's children.
    ///
    /// Returns `Ok(false)` when no module matched.
    pub fn send(&mut self, path: &str, message: &Message) -> Result<bool, AddressError> {
        let address: Address = path.parse()?;
        Ok(self.send_message(&address, message))
    }

    /// Routes `message` along an already parsed address.
    pub fn send_message(&mut self, address: &Address, message: &Message) -> bool {
        self.route(address.route(), message)
    }

    fn route(&mut self, route: Route<'_>, message: &Message) -> bool {
        let delivered = self
            .graph
            .module_mut(self.root)
            .is_some_and(|root| root.send_message(route, message));
        if !delivered {
            #[cfg(feature = "tracing")]
            tracing::debug!("message dropped: no child named '{}'", route.current());
        }
        delivered
    }

    /// Rewinds the clock to zero.
    pub fn reset(&mut self) {
        self.timestamp = 0;
    }

    /// Releases the root and everything below it.
    pub fn release(&mut self) {
        self.graph.release();
        self.inputs.clear();
    }

    /// The root module.
    pub fn root(&self) -> Option<&dyn Module> {
        self.graph.module(self.root)
    }

    /// Mutable access to the root module.
    pub fn root_mut(&mut self) -> Option<&mut dyn Module> {
        self.graph.module_mut(self.root)
    }

    /// Start of the next block, in samples.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Samples per block.
    pub fn block_length(&self) -> usize {
        self.graph.block_length()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    /// Number of root outlets.
    pub fn outlet_count(&self) -> usize {
        self.graph.outlet_count(self.root)
    }

    /// Number of root inlets.
    pub fn inlet_count(&self) -> usize {
        self.inputs.len()
    }
}
