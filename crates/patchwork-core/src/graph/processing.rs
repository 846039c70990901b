//! Module graph: arena storage, connection API and the pull scheduler.
//!
//! [`ModuleGraph`] owns every module placed in it. Connections are mirrored
//! records of arena indices, so cycles in the signal graph never become
//! ownership cycles. Topology tolerances (out-of-range ports, duplicate or
//! missing edges) are no-ops reported through the return value, never errors.
//!
//! # Scheduling
//!
//! [`produce()`](ModuleGraph::produce) is pull based. A node is computed at
//! most once per cycle: its `processed` flag is set *before* its upstream
//! modules are pulled, so a feedback edge that leads back to it stops there
//! and reads the outlet contents left over from the previous cycle. Feedback
//! paths therefore carry a one-block delay.

use crate::address::Route;
use crate::error::GraphError;
use crate::module::{Inputs, Message, Module, Outputs};
use crate::patch::Patch;

use super::node::{NodeData, NodeId, NodeKind};
use super::port::{Connection, Port, accumulate};

/// Returns true if `identifier` can be assigned to a user module.
///
/// Identifiers must be non-empty and contain neither `/` (the address
/// separator) nor `:` (reserved for patch bridges).
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty() && !identifier.contains(['/', ':'])
}

/// Arena of modules plus their ports, connections and cycle flags.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add modules: [`add_module()`](Self::add_module)
/// 3. Connect ports: [`connect()`](Self::connect)
/// 4. Per cycle: [`prepare_all()`](Self::prepare_all), then
///    [`produce()`](Self::produce) on the nodes whose output you need
pub struct ModuleGraph {
    nodes: Vec<Option<NodeData>>,
    block_length: usize,
    sample_rate: f32,
}

impl ModuleGraph {
    /// Creates an empty graph.
    ///
    /// # Arguments
    ///
    /// * `block_length` - Samples per port buffer (e.g. 512)
    /// * `sample_rate` - Sample rate in Hz (e.g. 44100.0)
    pub fn new(block_length: usize, sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            block_length,
            sample_rate,
        }
    }

    /// Samples per block.
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // --- Node mutations ---

    /// Adds a module under the given identifier. Returns the new node's ID.
    ///
    /// Port buffers are allocated here, sized to the graph's block length.
    pub fn add_module(
        &mut self,
        identifier: impl Into<String>,
        module: Box<dyn Module>,
    ) -> Result<NodeId, GraphError> {
        let identifier = identifier.into();
        if !is_valid_identifier(&identifier) {
            return Err(GraphError::InvalidIdentifier(identifier));
        }
        Ok(self.insert(identifier, NodeKind::Module(module)))
    }

    /// Adds a boundary bridge with its reserved identifier.
    pub(crate) fn add_bridge(&mut self, kind: NodeKind) -> NodeId {
        let identifier = match kind {
            NodeKind::Inlet(k) => Patch::inlet_identifier(k),
            NodeKind::Outlet(k) => Patch::outlet_identifier(k),
            NodeKind::Module(_) => String::from("module"),
        };
        self.insert(identifier, kind)
    }

    pub(crate) fn insert(&mut self, identifier: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: '{identifier}' as {id}");
        self.nodes
            .push(Some(NodeData::new(identifier, kind, self.block_length)));
        id
    }

    /// Removes a module, disconnecting every edge that touches it and
    /// releasing it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.node(id).ok_or(GraphError::ModuleNotFound(id))?;

        // Collect the far ends first to avoid holding a borrow across mutation.
        let incoming: Vec<(usize, Connection)> = node
            .inlets
            .iter()
            .enumerate()
            .flat_map(|(inlet, port)| port.connections().iter().map(move |c| (inlet, *c)))
            .collect();
        let outgoing: Vec<(usize, Connection)> = node
            .outlets
            .iter()
            .enumerate()
            .flat_map(|(outlet, port)| port.connections().iter().map(move |c| (outlet, *c)))
            .collect();

        for (inlet, source) in incoming {
            self.disconnect(source.module, source.port, id, inlet);
        }
        for (outlet, dest) in outgoing {
            self.disconnect(id, outlet, dest.module, dest.port);
        }

        if let Some(mut node) = self.nodes[id.0 as usize].take()
            && let NodeKind::Module(module) = &mut node.kind
        {
            module.release();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: {id}");
        Ok(())
    }

    /// Returns true if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes (bridges included).
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Returns true if the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IDs of all live nodes in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeId(index as u32))
    }

    // --- Identifiers ---

    /// Identifier of a node.
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.identifier.as_str())
    }

    /// Renames a module. Bridges cannot be renamed.
    pub fn set_identifier(
        &mut self,
        id: NodeId,
        identifier: impl Into<String>,
    ) -> Result<(), GraphError> {
        let identifier = identifier.into();
        if !is_valid_identifier(&identifier) {
            return Err(GraphError::InvalidIdentifier(identifier));
        }
        let node = self.node_mut(id).ok_or(GraphError::ModuleNotFound(id))?;
        if !matches!(node.kind, NodeKind::Module(_)) {
            return Err(GraphError::InvalidIdentifier(node.identifier.clone()));
        }
        node.identifier = identifier;
        Ok(())
    }

    /// First node (in insertion order) with the given identifier.
    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        self.ids()
            .find(|&id| self.identifier(id) == Some(identifier))
    }

    // --- Module access ---

    /// The module inside a node. `None` for bridges and missing nodes.
    pub fn module(&self, id: NodeId) -> Option<&dyn Module> {
        match &self.node(id)?.kind {
            NodeKind::Module(module) => Some(module.as_ref()),
            _ => None,
        }
    }

    /// Mutable access to the module inside a node.
    pub fn module_mut(&mut self, id: NodeId) -> Option<&mut dyn Module> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Module(module) => Some(module.as_mut()),
            _ => None,
        }
    }

    // --- Ports ---

    /// Number of inlets of a node (0 if missing).
    pub fn inlet_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| node.inlets.len())
    }

    /// Number of outlets of a node (0 if missing).
    pub fn outlet_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| node.outlets.len())
    }

    /// Inlet `index` of a node.
    pub fn inlet(&self, id: NodeId, index: usize) -> Option<&Port> {
        self.node(id)?.inlets.get(index)
    }

    /// Outlet `index` of a node.
    pub fn outlet(&self, id: NodeId, index: usize) -> Option<&Port> {
        self.node(id)?.outlets.get(index)
    }

    pub(crate) fn outlet_mut(&mut self, id: NodeId, index: usize) -> Option<&mut Port> {
        self.node_mut(id)?.outlets.get_mut(index)
    }

    // --- Connections ---

    /// Connects outlet `outlet` of `from` to inlet `inlet` of `to`.
    ///
    /// Inserts the mirrored pair and returns true. Returns false (and changes
    /// nothing) if either node is missing, either index is out of range, or
    /// the pair is already connected. Buffer contents are not touched.
    pub fn connect(&mut self, from: NodeId, outlet: usize, to: NodeId, inlet: usize) -> bool {
        let in_range = self.outlet(from, outlet).is_some() && self.inlet(to, inlet).is_some();
        if !in_range || self.is_connected(from, outlet, to, inlet) {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_connect ignored: {from}[{outlet}] → {to}[{inlet}]");
            return false;
        }

        if let Some(port) = self.outlet_mut(from, outlet) {
            port.insert(Connection {
                module: to,
                port: inlet,
            });
        }
        if let Some(port) = self.inlet_mut(to, inlet) {
            port.insert(Connection {
                module: from,
                port: outlet,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from}[{outlet}] → {to}[{inlet}]");
        true
    }

    /// Removes the mirrored pair if present. Returns false if it was not.
    pub fn disconnect(&mut self, from: NodeId, outlet: usize, to: NodeId, inlet: usize) -> bool {
        if !self.is_connected(from, outlet, to, inlet) {
            return false;
        }
        if let Some(port) = self.outlet_mut(from, outlet) {
            port.remove(Connection {
                module: to,
                port: inlet,
            });
        }
        if let Some(port) = self.inlet_mut(to, inlet) {
            port.remove(Connection {
                module: from,
                port: outlet,
            });
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {from}[{outlet}] → {to}[{inlet}]");
        true
    }

    /// Returns true if outlet `outlet` of `from` feeds inlet `inlet` of `to`.
    pub fn is_connected(&self, from: NodeId, outlet: usize, to: NodeId, inlet: usize) -> bool {
        self.outlet(from, outlet).is_some_and(|port| {
            port.contains(Connection {
                module: to,
                port: inlet,
            })
        })
    }

    // --- Scheduling ---

    /// Clears the `processed` flag of one node.
    pub fn prepare(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.processed = false;
        }
    }

    /// Clears the `processed` flag of every node.
    pub fn prepare_all(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.processed = false;
        }
    }

    /// Returns true if the node has been produced since its last prepare.
    pub fn is_processed(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.processed)
    }

    /// Produces one block for `id`, pulling its upstream modules first.
    ///
    /// For every inlet the buffer is zeroed, each source is produced in
    /// connection order, and the source outlet is summed in. Only then does
    /// the node's own module run. Returns immediately if the node was already
    /// produced this cycle.
    pub fn produce(&mut self, id: NodeId, timestamp: u64) {
        let inlet_count = match self.node_mut(id) {
            Some(node) if !node.processed => {
                node.processed = true;
                node.inlets.len()
            }
            _ => return,
        };

        for inlet in 0..inlet_count {
            let Some(mut buffer) = self.inlet_mut(id, inlet).map(Port::take_buffer) else {
                continue;
            };
            buffer.fill(0.0);

            let mut index = 0;
            while let Some(source) = self
                .inlet(id, inlet)
                .and_then(|port| port.connections().get(index).copied())
            {
                self.produce(source.module, timestamp);
                if let Some(port) = self.outlet(source.module, source.port) {
                    accumulate(&mut buffer, port.buffer());
                }
                index += 1;
            }

            if let Some(port) = self.inlet_mut(id, inlet) {
                port.restore_buffer(buffer);
            }
        }

        if let Some(node) = self.node_mut(id)
            && let NodeKind::Module(module) = &mut node.kind
        {
            module.process(
                Inputs::new(&node.inlets),
                Outputs::new(&mut node.outlets),
                timestamp,
            );
        }
    }

    // --- Messaging ---

    /// Routes a message to the first node whose identifier matches the
    /// route's current component.
    ///
    /// A resolved route delivers to that module; otherwise the module is asked
    /// to route the remainder. Unmatched identifiers drop the message.
    /// Returns true if some module received it.
    pub fn send_message(&mut self, route: Route<'_>, message: &Message) -> bool {
        let identifier = route.current();
        let Some(node) = self
            .nodes
            .iter_mut()
            .flatten()
            .find(|node| node.identifier == identifier)
        else {
            #[cfg(feature = "tracing")]
            tracing::debug!("message dropped: no module named '{identifier}'");
            return false;
        };

        let NodeKind::Module(module) = &mut node.kind else {
            return false;
        };
        match route.next() {
            None => {
                module.receive_message(message);
                true
            }
            Some(rest) => module.send_message(rest, message),
        }
    }

    // --- Lifecycle ---

    /// Clears every connection set, releases every module once and drops
    /// them. Node IDs are not reused afterwards.
    pub fn release(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.clear_connections();
        }
        for slot in &mut self.nodes {
            if let Some(mut node) = slot.take()
                && let NodeKind::Module(module) = &mut node.kind
            {
                module.release();
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    fn inlet_mut(&mut self, id: NodeId, index: usize) -> Option<&mut Port> {
        self.node_mut(id)?.inlets.get_mut(index)
    }
}
