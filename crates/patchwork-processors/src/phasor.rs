//! Phase accumulator driving table and square oscillators.

/// Wraps `x` into `[0, 1)`.
#[inline]
pub fn wrap_unit(x: f32) -> f32 {
    let wrapped = x - x.floor();
    // Tiny negative inputs round up to exactly 1.0.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// A phase in `[0, 1)` advanced by a fixed increment per sample.
///
/// # Example
///
/// ```rust
/// use patchwork_processors::Phasor;
///
/// let mut phasor = Phasor::new(0.0, 0.25);
/// let phases: Vec<f32> = (0..5).map(|_| phasor.next(0.0)).collect();
/// assert_eq!(phases, vec![0.0, 0.25, 0.5, 0.75, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phasor {
    phase: f32,
    increment: f32,
}

impl Phasor {
    /// Creates a phasor at `phase` advancing by `increment` cycles per sample.
    pub fn new(phase: f32, increment: f32) -> Self {
        Self {
            phase: wrap_unit(phase),
            increment,
        }
    }

    /// Sets the increment from a frequency in Hz.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        self.increment = frequency / sample_rate;
    }

    /// Sets the increment in cycles per sample.
    pub fn set_increment(&mut self, increment: f32) {
        self.increment = increment;
    }

    /// Current increment in cycles per sample.
    pub fn increment(&self) -> f32 {
        self.increment
    }

    /// Jumps to `phase` (wrapped into `[0, 1)`).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_unit(phase);
    }

    /// Current phase.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Returns the current phase offset by `phase_mod`, then advances.
    ///
    /// The modulation only shifts the returned value; it does not
    /// accumulate into the stored phase.
    #[inline]
    pub fn next(&mut self, phase_mod: f32) -> f32 {
        let out = wrap_unit(self.phase + phase_mod);
        self.phase = wrap_unit(self.phase + self.increment);
        out
    }
}
