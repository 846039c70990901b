//! Test harness that drives one module inside a graph.

use patchwork_core::{Inputs, Message, Module, ModuleGraph, NodeId, Outputs, Voice, copy_prefix};

/// Replays the same samples every block.
struct Source(Vec<f32>);

impl Module for Source {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
        copy_prefix(outputs.get_mut(0), &self.0);
    }
}

pub(crate) struct Harness {
    graph: ModuleGraph,
    id: NodeId,
    timestamp: u64,
}

impl Harness {
    pub(crate) fn new(module: Box<dyn Module>, block_length: usize, sample_rate: f32) -> Self {
        let mut graph = ModuleGraph::new(block_length, sample_rate);
        let id = graph.add_module("unit", module).unwrap();
        Self {
            graph,
            id,
            timestamp: 0,
        }
    }

    /// Connects a source replaying `samples` to `inlet`.
    pub(crate) fn feed(&mut self, inlet: usize, samples: Vec<f32>) {
        let source = self.graph.add_module("source", Box::new(Source(samples))).unwrap();
        assert!(self.graph.connect(source, 0, self.id, inlet));
    }

    pub(crate) fn send(&mut self, message: &Message) {
        self.graph.module_mut(self.id).unwrap().receive_message(message);
    }

    /// Inspects the module under test as a voice.
    pub(crate) fn voice<R>(&self, inspect: impl FnOnce(&dyn Voice) -> R) -> R {
        inspect(self.graph.module(self.id).and_then(|module| module.as_voice()).unwrap())
    }

    /// Produces one block and returns every outlet.
    pub(crate) fn run(&mut self) -> Vec<Vec<f32>> {
        self.graph.prepare_all();
        self.graph.produce(self.id, self.timestamp);
        self.timestamp += self.graph.block_length() as u64;
        (0..self.graph.outlet_count(self.id))
            .map(|k| self.graph.outlet(self.id, k).unwrap().buffer().to_vec())
            .collect()
    }
}
