//! Property-based tests for the module graph.
//!
//! Checks connection bookkeeping and additive mixing over randomized
//! topologies using proptest.

use patchwork_core::{Inputs, Module, ModuleGraph, NodeId, Outputs};
use proptest::prelude::*;

struct Constant(f32);

impl Module for Constant {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
        outputs.fill(self.0);
    }
}

/// Two inlets, one outlet; outputs the sum of both inlets.
struct Mixer;

impl Module for Mixer {
    fn inlet_count(&self) -> usize {
        2
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
        let (a, b) = (inputs.get(0), inputs.get(1));
        for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
            *out = a[i] + b[i];
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// However many times an edge is connected, exactly one mirrored record
    /// exists, and a single disconnect removes it.
    #[test]
    fn connect_is_idempotent(repeats in 1usize..8, inlet in 0usize..2) {
        let mut graph = ModuleGraph::new(8, 48000.0);
        let source = graph.add_module("src", Box::new(Constant(1.0))).unwrap();
        let mixer = graph.add_module("mix", Box::new(Mixer)).unwrap();

        let accepted = (0..repeats)
            .filter(|_| graph.connect(source, 0, mixer, inlet))
            .count();
        prop_assert_eq!(accepted, 1);
        prop_assert_eq!(graph.outlet(source, 0).unwrap().connections().len(), 1);
        prop_assert_eq!(graph.inlet(mixer, inlet).unwrap().connections().len(), 1);

        prop_assert!(graph.disconnect(source, 0, mixer, inlet));
        prop_assert!(!graph.disconnect(source, 0, mixer, inlet));
        prop_assert!(!graph.outlet(source, 0).unwrap().is_connected());
        prop_assert!(!graph.inlet(mixer, inlet).unwrap().is_connected());
    }

    /// An inlet fed by several constants holds their sum on every cycle,
    /// independent of how often the graph is pulled.
    #[test]
    fn inlet_mixing_is_additive(
        values in prop::collection::vec(-4.0f32..4.0, 1..6),
        cycles in 1u64..5,
        block_length in 1usize..64,
    ) {
        let mut graph = ModuleGraph::new(block_length, 48000.0);
        let mixer = graph.add_module("mix", Box::new(Mixer)).unwrap();
        let sources: Vec<NodeId> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| graph.add_module(format!("c{i}"), Box::new(Constant(v))).unwrap())
            .collect();
        for &source in &sources {
            graph.connect(source, 0, mixer, 0);
        }

        let expected: f32 = values.iter().sum();
        for cycle in 0..cycles {
            graph.prepare_all();
            graph.produce(mixer, cycle * block_length as u64);
            for &sample in graph.inlet(mixer, 0).unwrap().buffer() {
                prop_assert!((sample - expected).abs() < 1e-4);
            }
            for &sample in graph.inlet(mixer, 1).unwrap().buffer() {
                prop_assert_eq!(sample, 0.0);
            }
        }
    }

    /// Connecting to ports beyond a module's declared counts never changes
    /// the graph.
    #[test]
    fn out_of_range_connect_is_noop(outlet in 1usize..16, inlet in 2usize..16) {
        let mut graph = ModuleGraph::new(4, 48000.0);
        let source = graph.add_module("src", Box::new(Constant(1.0))).unwrap();
        let mixer = graph.add_module("mix", Box::new(Mixer)).unwrap();

        prop_assert!(!graph.connect(source, outlet, mixer, 0));
        prop_assert!(!graph.connect(source, 0, mixer, inlet));
        prop_assert!(!graph.outlet(source, 0).unwrap().is_connected());
    }
}
