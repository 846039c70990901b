//! The `sine` voice: an enveloped sine oscillator placed in the stereo field.

use patchwork_core::{Inputs, Module, Outputs, Settings, Voice, WaveTable};
use serde::{Deserialize, Serialize};

use crate::adsr::{Adsr, AdsrSettings};
use crate::oscillator::{Oscillator, OscillatorSettings};
use crate::panning::sinusoidal_panning;
use crate::settings::decode_settings;

/// Note-on settings of a [`SineVoice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SineNote {
    /// Frequency in Hz.
    pub frequency: f32,
    /// Peak amplitude.
    pub amplitude: f32,
    /// Stereo position, 0 left to 1 right.
    pub pan: f32,
}

impl Default for SineNote {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            amplitude: 0.5,
            pan: 0.5,
        }
    }
}

/// Envelope shared by every sine voice.
fn envelope_settings() -> AdsrSettings {
    AdsrSettings {
        attack_rate: 0.1,
        decay_rate: 0.1,
        release_rate: 1.4,
        sustain_level: 0.3,
        ..AdsrSettings::default()
    }
}

/// Two-outlet voice playing a table oscillator through an ADSR.
#[derive(Debug, Clone)]
pub struct SineVoice {
    oscillator: Oscillator,
    envelope: Adsr,
    pan: f32,
}

impl SineVoice {
    /// Creates an idle voice reading `table`.
    pub fn new(table: WaveTable, sample_rate: f32) -> Self {
        let mut envelope = Adsr::new();
        envelope.configure(&envelope_settings(), sample_rate);
        Self {
            oscillator: Oscillator::table(table, &OscillatorSettings::default(), sample_rate),
            envelope,
            pan: 0.5,
        }
    }
}

impl Module for SineVoice {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        2
    }

    fn process(&mut self, _inputs: Inputs<'_>, mut outputs: Outputs<'_>, _timestamp: u64) {
        let Some((left, right)) = outputs.stereo_mut() else {
            return;
        };
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let sample = self.oscillator.advance(0.0) * self.envelope.advance();
            (*l, *r) = sinusoidal_panning(sample, self.pan);
        }
    }

    fn as_voice(&self) -> Option<&dyn Voice> {
        Some(self)
    }

    fn as_voice_mut(&mut self) -> Option<&mut dyn Voice> {
        Some(self)
    }
}

impl Voice for SineVoice {
    fn note_on(&mut self, _duration: Option<f32>, _sample_rate: f32, settings: &Settings) {
        // Malformed note settings fall back to the defaults.
        let note: SineNote = decode_settings(settings).unwrap_or_default();
        self.oscillator.set_frequency(note.frequency);
        self.oscillator.set_amplitude(note.amplitude);
        self.oscillator.set_phase(0.0);
        self.pan = note.pan;
        self.envelope.gate(1.0);
    }

    fn note_off(&mut self) {
        self.envelope.gate(0.0);
    }

    fn is_finished(&self) -> bool {
        self.envelope.is_idle()
    }
}
