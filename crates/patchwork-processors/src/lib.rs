//! Patchwork Processors - leaf processing units
//!
//! Every unit here implements [`patchwork_core::Module`] (and, for voices and
//! grains, the matching pool traits). Construction settings are plain serde
//! structs decoded from schema-less [`patchwork_core::Settings`] with
//! [`decode_settings`]; missing keys take the documented defaults.
//!
//! # Units
//!
//! | Unit | Inlets | Outlets |
//! |------|--------|---------|
//! | [`Oscillator`] (table or square) | phase mod, frequency, amplitude | 1 |
//! | [`AdsrModule`] | gate | 1 |
//! | [`Delay`] | signal, delay time | 1 |
//! | [`Allpass`] | signal, delay time, feedback | 1 |
//! | [`SineVoice`] | none | 2 |
//! | [`granulator()`] of [`TableGrain`]s | none | 2 |

pub mod adsr;
pub mod delay;
pub mod grain;
pub mod oscillator;
pub mod panning;
pub mod phasor;
pub mod settings;
pub mod sine_voice;

#[cfg(test)]
mod testing;

pub use adsr::{Adsr, AdsrModule, AdsrSettings, AdsrStage};
pub use delay::{Allpass, AllpassSettings, Delay, DelayLine, DelaySettings};
pub use grain::{GrainParameters, GranulatorSettings, TableGrain, TableGrainFactory, granulator};
pub use oscillator::{Oscillator, OscillatorSettings, Shape};
pub use panning::sinusoidal_panning;
pub use phasor::{Phasor, wrap_unit};
pub use settings::{decode_settings, number};
pub use sine_voice::{SineNote, SineVoice};
