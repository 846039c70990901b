//! Polyphonic voice pool.

use std::collections::VecDeque;

use serde_json::Value;

use crate::graph::{ModuleGraph, NodeId, NodeKind, accumulate};
use crate::module::{Inputs, Message, Module, Outputs, Settings, Voice};

/// Creates voice instances for a [`PolyVoice`] pool on demand.
pub trait VoiceFactory: Send {
    /// Builds a fresh voice sized for the pool's block length and sample rate.
    fn create(&mut self, block_length: usize, sample_rate: f32) -> Box<dyn Voice>;
}

impl<F> VoiceFactory for F
where
    F: FnMut(usize, f32) -> Box<dyn Voice> + Send,
{
    fn create(&mut self, block_length: usize, sample_rate: f32) -> Box<dyn Voice> {
        self(block_length, sample_rate)
    }
}

/// Arena adapter exposing a boxed voice as a module with the voice capability.
struct Pooled(Box<dyn Voice>);

impl Module for Pooled {
    fn inlet_count(&self) -> usize {
        self.0.inlet_count()
    }

    fn outlet_count(&self) -> usize {
        self.0.outlet_count()
    }

    fn process(&mut self, inputs: Inputs<'_>, outputs: Outputs<'_>, timestamp: u64) {
        self.0.process(inputs, outputs, timestamp);
    }

    fn receive_message(&mut self, message: &Message) {
        self.0.receive_message(message);
    }

    fn release(&mut self) {
        self.0.release();
    }

    fn as_voice(&self) -> Option<&dyn Voice> {
        Some(self.0.as_ref())
    }

    fn as_voice_mut(&mut self) -> Option<&mut dyn Voice> {
        Some(self.0.as_mut())
    }
}

struct ActiveVoice {
    id: NodeId,
    /// Samples left before the automatic note-off. `None` once it was sent,
    /// or when the note was triggered without a duration.
    samples_until_off: Option<i64>,
}

/// Plays any number of voices at once, recycling finished ones.
///
/// Voices are triggered with [`note_on()`](Self::note_on) or through a
/// message of the form `{"duration": seconds, "settings": ...}`. A note with
/// a duration receives its note-off once that many samples have been
/// produced; the voice stays in the mix until it reports
/// [`is_finished()`](Voice::is_finished). `{"noteOff": true}` releases every
/// active voice.
pub struct PolyVoice {
    voices: ModuleGraph,
    factory: Box<dyn VoiceFactory>,
    outlets: usize,
    free: VecDeque<NodeId>,
    used: Vec<ActiveVoice>,
}

impl PolyVoice {
    /// Creates an empty pool with `outlets` summed outputs.
    pub fn new(
        factory: impl VoiceFactory + 'static,
        outlets: usize,
        block_length: usize,
        sample_rate: f32,
    ) -> Self {
        Self::with_factory(Box::new(factory), outlets, block_length, sample_rate)
    }

    /// Creates an empty pool around an already boxed factory.
    pub fn with_factory(
        factory: Box<dyn VoiceFactory>,
        outlets: usize,
        block_length: usize,
        sample_rate: f32,
    ) -> Self {
        Self {
            voices: ModuleGraph::new(block_length, sample_rate),
            factory,
            outlets,
            free: VecDeque::new(),
            used: Vec::new(),
        }
    }

    /// Triggers a voice and returns its handle.
    ///
    /// Reuses the oldest free voice, or asks the factory for a new one.
    pub fn note_on(&mut self, duration: Option<f32>, settings: &Settings) -> NodeId {
        let sample_rate = self.voices.sample_rate();
        let id = match self.free.pop_front() {
            Some(id) => id,
            None => {
                let voice = self
                    .factory
                    .create(self.voices.block_length(), sample_rate);
                let id = self
                    .voices
                    .insert(String::from("voice"), NodeKind::Module(Box::new(Pooled(voice))));
                #[cfg(feature = "tracing")]
                tracing::debug!("voice pool grew to {} voices", self.voice_count() + 1);
                id
            }
        };

        if let Some(voice) = self.voice_mut(id) {
            voice.note_on(duration, sample_rate, settings);
        }
        self.used.push(ActiveVoice {
            id,
            samples_until_off: duration.map(|seconds| (seconds * sample_rate) as i64),
        });
        id
    }

    /// Sends note-off to an active voice. Returns false if `id` is not active.
    pub fn note_off(&mut self, id: NodeId) -> bool {
        let Some(active) = self.used.iter_mut().find(|active| active.id == id) else {
            return false;
        };
        active.samples_until_off = None;
        if let Some(voice) = self.voices.module_mut(id).and_then(Module::as_voice_mut) {
            voice.note_off();
        }
        true
    }

    /// Sends note-off to every active voice.
    pub fn release_all(&mut self) {
        for active in &mut self.used {
            active.samples_until_off = None;
            if let Some(voice) = self.voices.module_mut(active.id).and_then(Module::as_voice_mut) {
                voice.note_off();
            }
        }
    }

    /// Number of idle voices waiting for reuse.
    pub fn free_voices(&self) -> usize {
        self.free.len()
    }

    /// Number of voices currently in the mix.
    pub fn used_voices(&self) -> usize {
        self.used.len()
    }

    /// Total voices created so far.
    pub fn voice_count(&self) -> usize {
        self.free.len() + self.used.len()
    }

    /// The voice behind a handle.
    pub fn voice(&self, id: NodeId) -> Option<&dyn Voice> {
        self.voices.module(id)?.as_voice()
    }

    fn voice_mut(&mut self, id: NodeId) -> Option<&mut dyn Voice> {
        self.voices.module_mut(id)?.as_voice_mut()
    }
}

impl Module for PolyVoice {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        self.outlets
    }

    fn process(&mut self, _inputs: Inputs<'_>, mut outputs: Outputs<'_>, timestamp: u64) {
        outputs.fill(0.0);

        let voices = &self.voices;
        let free = &mut self.free;
        self.used.retain(|active| {
            let finished = voices
                .module(active.id)
                .and_then(Module::as_voice)
                .is_none_or(|voice| voice.is_finished());
            if finished {
                free.push_back(active.id);
            }
            !finished
        });

        let block_length = self.voices.block_length() as i64;
        for active in &mut self.used {
            self.voices.prepare(active.id);
            self.voices.produce(active.id, timestamp);
            for (k, out) in outputs.iter_mut().enumerate() {
                if let Some(port) = self.voices.outlet(active.id, k) {
                    accumulate(out, port.buffer());
                }
            }

            if let Some(remaining) = active.samples_until_off.as_mut() {
                *remaining -= block_length;
                if *remaining <= 0 {
                    active.samples_until_off = None;
                    let module = self.voices.module_mut(active.id);
                    if let Some(voice) = module.and_then(Module::as_voice_mut) {
                        voice.note_off();
                    }
                }
            }
        }
    }

    fn receive_message(&mut self, message: &Message) {
        if message.get("noteOff").and_then(Value::as_bool) == Some(true) {
            self.release_all();
            return;
        }
        let Some(fields) = message.as_object() else {
            #[cfg(feature = "tracing")]
            tracing::debug!("poly voice ignored non-object message: {message}");
            return;
        };
        let duration = fields
            .get("duration")
            .and_then(Value::as_f64)
            .map(|seconds| seconds as f32);
        let settings = fields.get("settings").unwrap_or(&Value::Null);
        self.note_on(duration, settings);
    }

    fn release(&mut self) {
        self.voices.release();
        self.free.clear();
        self.used.clear();
    }
}
