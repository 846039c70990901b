//! Windowed wave-table grains and the `granulator` module built from them.

use std::f32::consts::PI;

use patchwork_core::{
    ConstantDuration, ConstantParameters, Grain, GrainFactory, Granulator, PeriodicTicks, Settings,
    WaveTable,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::panning::sinusoidal_panning;
use crate::phasor::Phasor;
use crate::settings::decode_settings;

/// Per-grain parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainParameters {
    /// Oscillator frequency in Hz.
    pub frequency: f32,
    /// Peak amplitude.
    pub amplitude: f32,
    /// Stereo position, 0 left to 1 right.
    pub pan: f32,
}

impl Default for GrainParameters {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            amplitude: 0.2,
            pan: 0.5,
        }
    }
}

/// Table oscillator shaped by a half-sine window spanning the grain.
#[derive(Debug, Clone)]
pub struct TableGrain {
    table: WaveTable,
    phasor: Phasor,
    amplitude: f32,
    position: f32,
    step: f32,
    pan: f32,
}

impl TableGrain {
    /// Creates a silent grain reading `table`.
    pub fn new(table: WaveTable) -> Self {
        Self {
            table,
            phasor: Phasor::default(),
            amplitude: 0.0,
            position: 1.0,
            step: 0.0,
            pan: 0.5,
        }
    }

    fn window(&self) -> f32 {
        if self.position >= 1.0 {
            0.0
        } else {
            (PI * self.position).sin()
        }
    }
}

impl Grain for TableGrain {
    fn initialize(&mut self, duration: f32, sample_rate: f32, parameters: &Settings) {
        // The granulator validates its settings at build time; anything that
        // still fails to decode plays with the defaults.
        let parameters: GrainParameters = decode_settings(parameters).unwrap_or_default();
        let samples = duration * sample_rate;
        self.phasor = Phasor::new(0.0, parameters.frequency / sample_rate);
        self.amplitude = parameters.amplitude;
        self.position = 0.0;
        self.step = if samples >= 1.0 { samples.recip() } else { 1.0 };
        self.pan = parameters.pan;
    }

    fn process(&mut self) -> (f32, f32) {
        let sample = self.table.lookup(self.phasor.next(0.0)) * self.amplitude * self.window();
        self.position += self.step;
        sinusoidal_panning(sample, self.pan)
    }
}

/// Creates stereo [`TableGrain`]s sharing one table.
#[derive(Debug, Clone)]
pub struct TableGrainFactory {
    table: WaveTable,
}

impl TableGrainFactory {
    /// Factory for grains reading `table`.
    pub fn new(table: WaveTable) -> Self {
        Self { table }
    }
}

impl GrainFactory for TableGrainFactory {
    fn create(&mut self) -> Box<dyn Grain> {
        Box::new(TableGrain::new(self.table.clone()))
    }

    fn channel_count(&self) -> usize {
        2
    }
}

/// Settings of the `granulator` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranulatorSettings {
    /// Seconds between grain starts.
    pub interval: f32,
    /// Grain length in seconds.
    pub duration: f32,
    /// Grain frequency in Hz.
    pub frequency: f32,
    /// Grain amplitude.
    pub amplitude: f32,
    /// Grain stereo position.
    pub pan: f32,
    /// Wave table name.
    pub table: String,
}

impl Default for GranulatorSettings {
    fn default() -> Self {
        Self {
            interval: 0.05,
            duration: 0.1,
            frequency: 440.0,
            amplitude: 0.2,
            pan: 0.5,
            table: String::from("sine"),
        }
    }
}

/// Periodic granulator emitting identical table grains.
pub fn granulator(table: WaveTable, settings: &GranulatorSettings, sample_rate: f32) -> Granulator {
    let parameters = json!({
        "frequency": settings.frequency,
        "amplitude": settings.amplitude,
        "pan": settings.pan,
    });
    Granulator::new(
        PeriodicTicks::from_seconds(settings.interval, sample_rate),
        ConstantDuration(settings.duration),
        ConstantParameters(parameters),
        TableGrainFactory::new(table),
        sample_rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn window_silences_grain_edges() {
        let mut grain = TableGrain::new(WaveTable::new(vec![1.0, 1.0]));
        grain.initialize(1.0, 4.0, &json!({"amplitude": 1.0, "pan": 0.0}));
        let left: Vec<f32> = (0..5).map(|_| grain.process().0).collect();
        assert_eq!(left[0], 0.0);
        assert!((left[2] - 1.0).abs() < 1e-6);
        assert_eq!(left[4], 0.0);
    }

    #[test]
    fn initialize_reads_grain_parameters() {
        let mut grain = TableGrain::new(WaveTable::new(vec![1.0, 1.0]));
        grain.initialize(1.0, 4.0, &json!({"frequency": 2.0, "amplitude": 0.5, "pan": 1.0}));
        assert_eq!(grain.amplitude, 0.5);
        assert_eq!(grain.pan, 1.0);
        assert_eq!(grain.step, 0.25);
        let (left, right) = (0..3).map(|_| grain.process()).last().unwrap();
        assert!(left.abs() < 1e-6);
        assert!((right - 0.5).abs() < 1e-6);
    }

    #[test]
    fn malformed_grain_parameters_use_defaults() {
        let mut grain = TableGrain::new(WaveTable::default());
        grain.initialize(1.0, 4.0, &json!({"frequency": "high", "amplitude": 1.0}));
        let defaults = GrainParameters::default();
        assert_eq!(grain.amplitude, defaults.amplitude);
        assert_eq!(grain.pan, defaults.pan);
    }

    #[test]
    fn granulator_overlaps_grains() {
        let settings = GranulatorSettings {
            interval: 0.25,
            duration: 0.5,
            frequency: 1.0,
            ..GranulatorSettings::default()
        };
        let module = granulator(WaveTable::default(), &settings, 8.0);
        let mut harness = Harness::new(Box::new(module), 8, 8.0);
        let out = harness.run();
        assert_eq!(out.len(), 2);
        assert!(out[0].iter().any(|s| s.abs() > 0.0));
        assert!(out[0].iter().chain(&out[1]).all(|s| s.abs() <= 2.0 * settings.amplitude));
    }
}
