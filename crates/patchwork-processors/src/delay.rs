//! Fractional delay line plus the `delay` and `allpass` modules.
//!
//! Both modules read before they write, so a delay of one sample returns
//! the previous input. Delays are clamped to `[1, len]` samples where `len`
//! is the line length derived from `maxDelay`.

use patchwork_core::{Inputs, Message, Module, Outputs};
use serde::{Deserialize, Serialize};

use crate::settings::number;

/// Circular buffer with linearly interpolated reads.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write: usize,
}

impl DelayLine {
    /// Creates a silent line of `length` samples (at least one).
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            write: 0,
        }
    }

    /// Line length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; a line holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Appends one sample, overwriting the oldest.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write] = sample;
        self.write = (self.write + 1) % self.buffer.len();
    }

    #[inline]
    fn at(&self, writes_ago: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write + 2 * len - writes_ago % len) % len]
    }

    /// Sample written `delay` writes ago, interpolating fractional delays.
    ///
    /// `delay` is clamped to `[1, len]`. The sample past the oldest one wraps
    /// around to the newest.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = if delay.is_nan() { 1.0 } else { delay.clamp(1.0, len as f32) };
        let whole = delay.floor();
        let fraction = delay - whole;
        let first = whole as usize;
        let a = self.at(first);
        if fraction == 0.0 {
            return a;
        }
        let b = self.at(first + 1);
        a + (b - a) * fraction
    }

    /// Zeroes the contents.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write = 0;
    }
}

fn line_length(max_delay: f32, sample_rate: f32) -> usize {
    (max_delay * sample_rate).max(1.0) as usize
}

/// Settings of the `delay` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelaySettings {
    /// Line length in seconds.
    pub max_delay: f32,
    /// Delay time in seconds.
    pub delay: f32,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            max_delay: 1.0,
            delay: 1.0,
        }
    }
}

/// Plain delay: inlet 0 signal, inlet 1 delay time in seconds.
#[derive(Debug, Clone)]
pub struct Delay {
    line: DelayLine,
    delay: f32,
    sample_rate: f32,
}

impl Delay {
    /// Creates a delay from settings.
    pub fn new(settings: &DelaySettings, sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new(line_length(settings.max_delay, sample_rate)),
            delay: settings.delay * sample_rate,
            sample_rate,
        }
    }

    /// Current delay in samples.
    pub fn delay_samples(&self) -> f32 {
        self.delay
    }
}

impl Module for Delay {
    fn inlet_count(&self) -> usize {
        2
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, _timestamp: u64) {
        let signal = inputs.connected(0);
        let time = inputs.connected(1);
        for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
            let x = signal.and_then(|buffer| buffer.get(i)).copied().unwrap_or(0.0);
            let delay = time
                .and_then(|buffer| buffer.get(i))
                .map_or(self.delay, |seconds| seconds * self.sample_rate);
            *out = self.line.read(delay);
            self.line.write(x);
        }
    }

    fn receive_message(&mut self, message: &Message) {
        if let Some(seconds) = number(message, "delay") {
            self.delay = seconds * self.sample_rate;
        }
    }
}

/// Settings of the `allpass` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllpassSettings {
    /// Line length in seconds.
    pub max_delay: f32,
    /// Delay time in seconds.
    pub delay: f32,
    /// Feedback gain.
    pub feedback: f32,
}

impl Default for AllpassSettings {
    fn default() -> Self {
        Self {
            max_delay: 1.0,
            delay: 1.0,
            feedback: 0.4,
        }
    }
}

/// Schroeder allpass: inlet 0 signal, inlet 1 delay time in seconds,
/// inlet 2 feedback gain.
#[derive(Debug, Clone)]
pub struct Allpass {
    line: DelayLine,
    delay: f32,
    feedback: f32,
    sample_rate: f32,
}

impl Allpass {
    /// Creates an allpass from settings.
    pub fn new(settings: &AllpassSettings, sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new(line_length(settings.max_delay, sample_rate)),
            delay: settings.delay * sample_rate,
            feedback: settings.feedback,
            sample_rate,
        }
    }

    /// Current feedback gain.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Filters one sample with a delay of `delay` samples.
    #[inline]
    pub fn tick(&mut self, x: f32, delay: f32) -> f32 {
        let delayed = self.line.read(delay);
        let v = x - self.feedback * delayed;
        self.line.write(v);
        v * self.feedback + delayed
    }
}

impl Module for Allpass {
    fn inlet_count(&self) -> usize {
        3
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, _timestamp: u64) {
        let signal = inputs.connected(0);
        let time = inputs.connected(1);
        let feedback = inputs.connected(2);
        for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
            if let Some(&g) = feedback.and_then(|buffer| buffer.get(i)) {
                self.feedback = g;
            }
            let x = signal.and_then(|buffer| buffer.get(i)).copied().unwrap_or(0.0);
            let delay = time
                .and_then(|buffer| buffer.get(i))
                .map_or(self.delay, |seconds| seconds * self.sample_rate);
            *out = self.tick(x, delay);
        }
    }

    fn receive_message(&mut self, message: &Message) {
        if let Some(seconds) = number(message, "delay") {
            self.delay = seconds * self.sample_rate;
        }
        if let Some(feedback) = number(message, "feedback") {
            self.feedback = feedback;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use serde_json::json;

    #[test]
    fn line_reads_past_writes() {
        let mut line = DelayLine::new(4);
        for x in [1.0, 2.0, 3.0] {
            line.write(x);
        }
        assert_eq!(line.read(1.0), 3.0);
        assert_eq!(line.read(3.0), 1.0);
        assert_eq!(line.read(1.5), 2.5);
        // Clamped into [1, len].
        assert_eq!(line.read(0.0), 3.0);
        assert_eq!(line.read(10.0), 0.0);
    }

    #[test]
    fn fractional_read_at_full_length_wraps_to_newest() {
        let mut line = DelayLine::new(3);
        for x in [1.0, 2.0, 3.0] {
            line.write(x);
        }
        assert_eq!(line.read(3.0), 1.0);
        line.write(4.0);
        assert_eq!(line.read(2.5), 2.5);
        // Oldest is 2.0; one further wraps to the newest, 4.0.
        assert_eq!(line.read(3.5), 3.0);
    }

    #[test]
    fn delay_module_shifts_signal() {
        let settings = DelaySettings {
            max_delay: 1.0,
            delay: 0.5,
        };
        let mut harness = Harness::new(Box::new(Delay::new(&settings, 4.0)), 4, 4.0);
        harness.feed(0, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(harness.run()[0], vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(harness.run()[0], vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn delay_message_changes_time() {
        let delay = Delay::new(&DelaySettings::default(), 4.0);
        let mut harness = Harness::new(Box::new(delay), 4, 4.0);
        harness.feed(0, vec![1.0, 2.0, 3.0, 4.0]);
        harness.send(&json!({"delay": 0.25}));
        assert_eq!(harness.run()[0], vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn allpass_impulse_response() {
        let settings = AllpassSettings {
            max_delay: 1.0,
            delay: 0.25,
            feedback: 0.5,
        };
        let mut harness = Harness::new(Box::new(Allpass::new(&settings, 4.0)), 4, 4.0);
        harness.feed(0, vec![1.0, 0.0, 0.0, 0.0]);
        // y0 = g, y1 = 1 - g^2, y2 = -g(1 - g^2), y3 = g^2(1 - g^2).
        assert_eq!(harness.run()[0], vec![0.5, 0.75, -0.375, 0.1875]);
    }
}
