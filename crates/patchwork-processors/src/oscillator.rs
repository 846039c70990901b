//! Table and square oscillators.
//!
//! Both shapes share one module layout: three inlets and one outlet.
//!
//! | inlet | role | when connected |
//! |-------|------|----------------|
//! | 0 | phase modulation (cycles) | added to the phase for each sample |
//! | 1 | frequency (Hz) | replaces the frequency, sample by sample |
//! | 2 | amplitude | replaces the amplitude, sample by sample |
//!
//! Unconnected inlets leave the stored values alone, so a frequency set by
//! message or settings only holds while inlet 1 is unpatched.

use patchwork_core::{Inputs, Message, Module, Outputs, WaveTable};
use serde::{Deserialize, Serialize};

use crate::phasor::Phasor;
use crate::settings::number;

/// Waveform produced by an [`Oscillator`].
#[derive(Debug, Clone)]
pub enum Shape {
    /// Linear-interpolated wave table lookup.
    Table(WaveTable),
    /// +1 for the first half of the cycle, -1 for the second.
    Square,
}

impl Shape {
    #[inline]
    fn sample(&self, phase: f32) -> f32 {
        match self {
            Shape::Table(table) => table.lookup(phase),
            Shape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Construction settings shared by `osc` and `square`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OscillatorSettings {
    /// Wave table name (table oscillators only).
    pub table: String,
    /// Frequency in Hz.
    pub frequency: f32,
    /// Start phase in cycles.
    pub phase: f32,
    /// Output amplitude.
    pub amplitude: f32,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self {
            table: String::from("sine"),
            frequency: 100.0,
            phase: 0.0,
            amplitude: 1.0,
        }
    }
}

/// Phasor-driven oscillator module.
#[derive(Debug, Clone)]
pub struct Oscillator {
    shape: Shape,
    phasor: Phasor,
    amplitude: f32,
    sample_rate: f32,
}

impl Oscillator {
    /// Creates an oscillator of the given shape.
    pub fn new(shape: Shape, settings: &OscillatorSettings, sample_rate: f32) -> Self {
        Self {
            shape,
            phasor: Phasor::new(settings.phase, settings.frequency / sample_rate),
            amplitude: settings.amplitude,
            sample_rate,
        }
    }

    /// Table oscillator.
    pub fn table(table: WaveTable, settings: &OscillatorSettings, sample_rate: f32) -> Self {
        Self::new(Shape::Table(table), settings, sample_rate)
    }

    /// Square oscillator.
    pub fn square(settings: &OscillatorSettings, sample_rate: f32) -> Self {
        Self::new(Shape::Square, settings, sample_rate)
    }

    /// Sets the frequency in Hz.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.phasor.set_frequency(frequency, self.sample_rate);
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phasor.increment() * self.sample_rate
    }

    /// Sets the output amplitude.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// Current output amplitude.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Jumps to `phase` in cycles.
    pub fn set_phase(&mut self, phase: f32) {
        self.phasor.set_phase(phase);
    }

    /// Next sample, with the phase shifted by `phase_mod` cycles.
    #[inline]
    pub fn advance(&mut self, phase_mod: f32) -> f32 {
        self.shape.sample(self.phasor.next(phase_mod)) * self.amplitude
    }
}

impl Module for Oscillator {
    fn inlet_count(&self) -> usize {
        3
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, _timestamp: u64) {
        let phase_mod = inputs.connected(0);
        let frequency = inputs.connected(1);
        let amplitude = inputs.connected(2);

        for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
            if let Some(&f) = frequency.and_then(|buffer| buffer.get(i)) {
                self.set_frequency(f);
            }
            if let Some(&a) = amplitude.and_then(|buffer| buffer.get(i)) {
                self.amplitude = a;
            }
            let pm = phase_mod.and_then(|buffer| buffer.get(i)).copied().unwrap_or(0.0);
            *out = self.advance(pm);
        }
    }

    fn receive_message(&mut self, message: &Message) {
        if let Some(frequency) = number(message, "frequency") {
            self.set_frequency(frequency);
        }
        if let Some(amplitude) = number(message, "amplitude") {
            self.amplitude = amplitude;
        }
        if let Some(phase) = number(message, "phase") {
            self.set_phase(phase);
        }
    }
}
