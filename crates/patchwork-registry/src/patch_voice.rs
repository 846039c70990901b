//! The `patch` voice: a sub-patch faded in and out by a linear envelope.

use std::path::PathBuf;
use std::sync::Arc;

use patchwork_config::PatchSource;
use patchwork_core::{Inputs, Module, ModuleGraph, NodeId, Outputs, Patch, Settings, Voice};
use patchwork_processors::decode_settings;
use serde::{Deserialize, Serialize};

use crate::build::build_patch;
use crate::error::BuildError;
use crate::registry::{BuildContext, Registry};

/// Note-on settings of a [`PatchVoice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchNote {
    /// Sub-patch to play, inline or by path.
    pub patch: Option<PatchSource>,
    /// Fade-in time in seconds.
    pub attack: f32,
    /// Fade-out time in seconds.
    pub release: f32,
}

impl Default for PatchNote {
    fn default() -> Self {
        Self {
            patch: None,
            attack: 1.0,
            release: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct LinearEnvelope {
    stage: Stage,
    level: f32,
    attack_step: f32,
    release_step: f32,
}

fn step_for(samples: f32) -> f32 {
    if samples >= 1.0 { samples.recip() } else { 1.0 }
}

impl LinearEnvelope {
    const IDLE: Self = Self {
        stage: Stage::Idle,
        level: 0.0,
        attack_step: 1.0,
        release_step: 1.0,
    };

    fn start(&mut self, attack_samples: f32, release_samples: f32) {
        self.stage = Stage::Attack;
        self.level = 0.0;
        self.attack_step = step_for(attack_samples);
        self.release_step = step_for(release_samples);
    }

    fn release(&mut self) {
        if self.stage != Stage::Idle {
            self.stage = Stage::Release;
        }
    }

    fn advance(&mut self) -> f32 {
        match self.stage {
            Stage::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
            Stage::Idle | Stage::Sustain => {}
        }
        self.level
    }
}

/// Voice that builds a fresh sub-patch on every note-on.
///
/// Has two outlets. A sub-patch with fewer outlets feeds its last outlet to
/// the remaining ones, so mono patches play on both channels. The voice is
/// finished once the release fade reaches zero, or immediately when the
/// note names no usable patch.
pub struct PatchVoice {
    registry: Arc<Registry>,
    directory: Option<PathBuf>,
    host: ModuleGraph,
    patch: Option<NodeId>,
    envelope: LinearEnvelope,
    gains: Vec<f32>,
}

impl PatchVoice {
    /// Creates an idle voice. Relative patch paths resolve against
    /// `directory`.
    pub fn new(
        registry: Arc<Registry>,
        directory: Option<PathBuf>,
        block_length: usize,
        sample_rate: f32,
    ) -> Self {
        Self {
            registry,
            directory,
            host: ModuleGraph::new(block_length, sample_rate),
            patch: None,
            envelope: LinearEnvelope::IDLE,
            gains: vec![0.0; block_length],
        }
    }

    fn load(&self, source: &PatchSource) -> Result<Patch, BuildError> {
        let loaded = source.resolve(self.directory.as_deref())?;
        let context = BuildContext::new(
            &self.registry,
            self.host.block_length(),
            self.host.sample_rate(),
        )
        .with_directory(loaded.directory.as_deref());
        build_patch(&loaded.descriptor, &context)
    }
}

impl Module for PatchVoice {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        2
    }

    fn process(&mut self, _inputs: Inputs<'_>, mut outputs: Outputs<'_>, timestamp: u64) {
        outputs.fill(0.0);
        let Some(id) = self.patch else {
            return;
        };

        self.host.prepare_all();
        self.host.produce(id, timestamp);
        for gain in &mut self.gains {
            *gain = self.envelope.advance();
        }

        let available = self.host.outlet_count(id);
        if available == 0 {
            return;
        }
        for (k, out) in outputs.iter_mut().enumerate() {
            let Some(port) = self.host.outlet(id, k.min(available - 1)) else {
                continue;
            };
            for ((sample, source), gain) in out.iter_mut().zip(port.buffer()).zip(&self.gains) {
                *sample = source * gain;
            }
        }
    }

    fn release(&mut self) {
        self.host.release();
        self.patch = None;
        self.envelope = LinearEnvelope::IDLE;
    }

    fn as_voice(&self) -> Option<&dyn Voice> {
        Some(self)
    }

    fn as_voice_mut(&mut self) -> Option<&mut dyn Voice> {
        Some(self)
    }
}

impl Voice for PatchVoice {
    fn note_on(&mut self, _duration: Option<f32>, sample_rate: f32, settings: &Settings) {
        let note: PatchNote = match decode_settings(settings) {
            Ok(note) => note,
            Err(err) => {
                tracing::warn!(%err, "patch voice ignored malformed note");
                return;
            }
        };
        let Some(source) = note.patch.as_ref() else {
            tracing::warn!("patch voice note names no patch");
            return;
        };
        let patch = match self.load(source) {
            Ok(patch) => patch,
            Err(err) => {
                tracing::warn!(%err, "patch voice could not build its patch");
                return;
            }
        };

        self.host.release();
        self.patch = self.host.add_module("patch", Box::new(patch)).ok();
        self.envelope.start(note.attack * sample_rate, note.release * sample_rate);
    }

    fn note_off(&mut self) {
        self.envelope.release();
    }

    fn is_finished(&self) -> bool {
        self.envelope.stage == Stage::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Rig {
        graph: ModuleGraph,
        id: NodeId,
        timestamp: u64,
    }

    impl Rig {
        fn new(block_length: usize, sample_rate: f32) -> Self {
            let registry = Arc::new(Registry::with_builtins());
            let voice = PatchVoice::new(registry, None, block_length, sample_rate);
            let mut graph = ModuleGraph::new(block_length, sample_rate);
            let id = graph.add_module("voice", Box::new(voice)).unwrap();
            Self {
                graph,
                id,
                timestamp: 0,
            }
        }

        fn voice(&mut self) -> &mut dyn Voice {
            self.graph.module_mut(self.id).and_then(|m| m.as_voice_mut()).unwrap()
        }

        fn run(&mut self) -> (Vec<f32>, Vec<f32>) {
            self.graph.prepare_all();
            self.graph.produce(self.id, self.timestamp);
            self.timestamp += self.graph.block_length() as u64;
            let out = |k| self.graph.outlet(self.id, k).unwrap().buffer().to_vec();
            (out(0), out(1))
        }
    }

    fn dc_note() -> Settings {
        json!({
            "patch": {
                "numOutlets": 1,
                "modules": { "sq": { "type": "square", "settings": { "frequency": 0 } } },
                "connections": [ { "from": "sq", "to": "outlet:0" } ]
            },
            "attack": 0.5,
            "release": 0.25
        })
    }

    #[test]
    fn fades_in_and_out() {
        let mut rig = Rig::new(4, 8.0);
        rig.voice().note_on(None, 8.0, &dc_note());
        assert!(!rig.voice().is_finished());

        let (left, right) = rig.run();
        assert_eq!(left, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(left, right);

        rig.voice().note_off();
        let (left, _) = rig.run();
        assert_eq!(left, vec![0.5, 0.0, 0.0, 0.0]);
        assert!(rig.voice().is_finished());
    }

    #[test]
    fn note_without_patch_finishes_immediately() {
        let mut rig = Rig::new(4, 8.0);
        rig.voice().note_on(None, 8.0, &json!({"attack": 0.1}));
        assert!(rig.voice().is_finished());
        assert_eq!(rig.run().0, vec![0.0; 4]);
    }

    #[test]
    fn unknown_module_in_patch_is_not_fatal() {
        let mut rig = Rig::new(4, 8.0);
        let note = json!({"patch": {"modules": {"x": {"type": "theremin"}}}});
        rig.voice().note_on(None, 8.0, &note);
        assert!(rig.voice().is_finished());
    }
}
