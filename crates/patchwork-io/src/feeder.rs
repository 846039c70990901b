//! Adapts block-sized engine output to device-sized callback buffers.

use patchwork_core::{Engine, ScorePlayer};

/// Pulls blocks from an [`Engine`] on demand and copies them into
/// interleaved buffers of any length and channel count.
///
/// A mono root is duplicated onto the first two device channels. Device
/// channels beyond the root's outlets are silent.
pub struct BlockFeeder {
    engine: Engine,
    player: Option<ScorePlayer>,
    position: usize,
}

impl BlockFeeder {
    /// Wraps `engine`; `player`, if any, fires before every block.
    pub fn new(engine: Engine, player: Option<ScorePlayer>) -> Self {
        let position = engine.block_length();
        Self {
            engine,
            player,
            position,
        }
    }

    /// Fills `data` with interleaved frames of `channels` samples.
    pub fn fill(&mut self, data: &mut [f32], channels: usize) {
        let roots = self.engine.outlet_count();
        for frame in data.chunks_mut(channels.max(1)) {
            if self.position >= self.engine.block_length() {
                self.next_block();
            }
            for (c, out) in frame.iter_mut().enumerate() {
                let source = match (roots, c) {
                    (1, 0 | 1) => Some(0),
                    (_, c) if c < roots => Some(c),
                    _ => None,
                };
                *out = source
                    .and_then(|k| self.engine.outlet(k).get(self.position).copied())
                    .unwrap_or(0.0);
            }
            self.position += 1;
        }
    }

    fn next_block(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.play(&mut self.engine);
        }
        self.engine.process_block();
        self.position = 0;
    }

    /// The driven engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access to the driven engine.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Releases the engine's modules and returns it.
    pub fn into_engine(mut self) -> Engine {
        self.engine.release();
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_core::{Inputs, Module, Outputs, Patch};

    struct Counter(f32);

    impl Module for Counter {
        fn inlet_count(&self) -> usize {
            0
        }

        fn outlet_count(&self) -> usize {
            1
        }

        fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
            for out in outputs.get_mut(0).iter_mut() {
                *out = self.0;
                self.0 += 1.0;
            }
        }
    }

    /// Root whose outlets all carry the same count, starting at 1.
    fn feeder(outlets: usize) -> BlockFeeder {
        let mut patch = Patch::new(0, outlets, 2, 8.0);
        let counter = patch.add("counter", Box::new(Counter(1.0))).unwrap();
        for k in 0..outlets {
            let bridge = patch.outlet_bridge(k).unwrap();
            patch.connect(counter, 0, bridge, 0);
        }
        let engine = Engine::new("main", Box::new(patch), 2, 8.0).unwrap();
        BlockFeeder::new(engine, None)
    }

    #[test]
    fn callback_sizes_need_not_match_blocks() {
        let mut feeder = feeder(1);
        let mut first = [0.0; 3];
        let mut second = [0.0; 2];
        feeder.fill(&mut first, 1);
        feeder.fill(&mut second, 1);
        assert_eq!(first, [1.0, 2.0, 3.0]);
        assert_eq!(second, [4.0, 5.0]);
        assert_eq!(feeder.engine().timestamp(), 6);
    }

    #[test]
    fn mono_root_is_duplicated() {
        let mut feeder = feeder(1);
        let mut data = [0.0; 6];
        feeder.fill(&mut data, 2);
        assert_eq!(data, [1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn extra_device_channels_are_silent() {
        let mut feeder = feeder(2);
        let mut data = [9.0; 8];
        feeder.fill(&mut data, 4);
        assert_eq!(data, [1.0, 1.0, 0.0, 0.0, 2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn mono_device_takes_first_outlet() {
        let mut feeder = feeder(2);
        let mut data = [0.0; 2];
        feeder.fill(&mut data, 1);
        assert_eq!(data, [1.0, 2.0]);
    }
}
