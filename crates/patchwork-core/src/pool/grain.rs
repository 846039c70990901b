//! Granular scheduling: a sample-accurate grain pool.
//!
//! A [`Granulator`] asks its [`TickGenerator`] once per sample whether a new
//! grain should start. On a tick it takes a grain from the pool, asks the
//! [`DurationGenerator`] and [`ParameterGenerator`] how long it lasts and how
//! it sounds, and initializes it. Grains play for exactly their duration in
//! samples and then return to the free list.

use std::collections::VecDeque;

use crate::module::{Inputs, Module, Outputs, Settings};

/// A short-lived sound unit.
pub trait Grain: Send {
    /// Prepares the grain for a new run of `duration` seconds.
    fn initialize(&mut self, duration: f32, sample_rate: f32, parameters: &Settings);

    /// Next (left, right) sample. Mono grains return the same value twice or
    /// leave the right channel at zero.
    fn process(&mut self) -> (f32, f32);
}

/// Creates grains and declares how many channels they produce.
pub trait GrainFactory: Send {
    /// A fresh, uninitialized grain.
    fn create(&mut self) -> Box<dyn Grain>;

    /// 1 for mono, 2 for stereo.
    fn channel_count(&self) -> usize;
}

/// Decides, per sample, whether a grain starts.
pub trait TickGenerator: Send {
    /// True if a grain should start at `timestamp` (in samples).
    fn tick(&mut self, timestamp: u64) -> bool;
}

impl<F> TickGenerator for F
where
    F: FnMut(u64) -> bool + Send,
{
    fn tick(&mut self, timestamp: u64) -> bool {
        self(timestamp)
    }
}

/// Chooses the duration of a grain starting at `timestamp`.
pub trait DurationGenerator: Send {
    /// Grain length in seconds.
    fn duration(&mut self, timestamp: u64) -> f32;
}

impl<F> DurationGenerator for F
where
    F: FnMut(u64) -> f32 + Send,
{
    fn duration(&mut self, timestamp: u64) -> f32 {
        self(timestamp)
    }
}

/// Chooses the parameters of a grain starting at `timestamp`.
pub trait ParameterGenerator: Send {
    /// Parameters handed to [`Grain::initialize`].
    fn parameters(&mut self, timestamp: u64) -> &Settings;
}

/// Ticks every `period` samples, starting at sample 0.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTicks {
    period: u64,
}

impl PeriodicTicks {
    /// Ticks every `period` samples. A period of zero ticks every sample.
    pub fn new(period: u64) -> Self {
        Self {
            period: period.max(1),
        }
    }

    /// Ticks every `seconds`, rounded to whole samples.
    pub fn from_seconds(seconds: f32, sample_rate: f32) -> Self {
        Self::new((seconds * sample_rate).round().max(1.0) as u64)
    }
}

impl TickGenerator for PeriodicTicks {
    fn tick(&mut self, timestamp: u64) -> bool {
        timestamp % self.period == 0
    }
}

/// Every grain lasts the same number of seconds.
#[derive(Debug, Clone, Copy)]
pub struct ConstantDuration(pub f32);

impl DurationGenerator for ConstantDuration {
    fn duration(&mut self, _timestamp: u64) -> f32 {
        self.0
    }
}

/// Every grain receives the same parameters.
#[derive(Debug, Clone)]
pub struct ConstantParameters(pub Settings);

impl ParameterGenerator for ConstantParameters {
    fn parameters(&mut self, _timestamp: u64) -> &Settings {
        &self.0
    }
}

struct GrainVoice {
    grain: Box<dyn Grain>,
    remaining: u64,
}

/// Module that schedules and mixes grains.
///
/// Has no inlets and one outlet per grain channel.
pub struct Granulator {
    ticks: Box<dyn TickGenerator>,
    durations: Box<dyn DurationGenerator>,
    parameters: Box<dyn ParameterGenerator>,
    factory: Box<dyn GrainFactory>,
    sample_rate: f32,
    grains: Vec<GrainVoice>,
    free: VecDeque<usize>,
    used: Vec<usize>,
}

impl Granulator {
    /// Creates a granulator with an empty pool.
    pub fn new(
        ticks: impl TickGenerator + 'static,
        durations: impl DurationGenerator + 'static,
        parameters: impl ParameterGenerator + 'static,
        factory: impl GrainFactory + 'static,
        sample_rate: f32,
    ) -> Self {
        Self {
            ticks: Box::new(ticks),
            durations: Box::new(durations),
            parameters: Box::new(parameters),
            factory: Box::new(factory),
            sample_rate,
            grains: Vec::new(),
            free: VecDeque::new(),
            used: Vec::new(),
        }
    }

    /// Grains currently sounding.
    pub fn active_grains(&self) -> usize {
        self.used.len()
    }

    /// Grains waiting for reuse.
    pub fn free_grains(&self) -> usize {
        self.free.len()
    }

    /// Total grains created so far.
    pub fn grain_count(&self) -> usize {
        self.grains.len()
    }

    fn trigger(&mut self, timestamp: u64) {
        let index = match self.free.pop_front() {
            Some(index) => index,
            None => {
                self.grains.push(GrainVoice {
                    grain: self.factory.create(),
                    remaining: 0,
                });
                self.grains.len() - 1
            }
        };
        let duration = self.durations.duration(timestamp);
        let parameters = self.parameters.parameters(timestamp);
        let voice = &mut self.grains[index];
        voice.grain.initialize(duration, self.sample_rate, parameters);
        voice.remaining = (duration * self.sample_rate).max(0.0) as u64;
        self.used.push(index);
    }

    /// Advances one sample and returns the mixed (left, right) pair.
    fn step(&mut self, timestamp: u64) -> (f32, f32) {
        if self.ticks.tick(timestamp) {
            self.trigger(timestamp);
        }

        let grains = &self.grains;
        let free = &mut self.free;
        self.used.retain(|&index| {
            let done = grains[index].remaining == 0;
            if done {
                free.push_back(index);
            }
            !done
        });

        let (mut left, mut right) = (0.0, 0.0);
        for &index in &self.used {
            let voice = &mut self.grains[index];
            let (l, r) = voice.grain.process();
            left += l;
            right += r;
            voice.remaining -= 1;
        }
        (left, right)
    }
}

impl Module for Granulator {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        self.factory.channel_count().clamp(1, 2)
    }

    fn process(&mut self, _inputs: Inputs<'_>, mut outputs: Outputs<'_>, timestamp: u64) {
        if let Some((left, right)) = outputs.stereo_mut() {
            for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
                (*l, *r) = self.step(timestamp + i as u64);
            }
        } else {
            for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
                *out = self.step(timestamp + i as u64).0;
            }
        }
    }

    fn release(&mut self) {
        self.grains.clear();
        self.free.clear();
        self.used.clear();
    }
}
