//! Shared single-cycle wave tables.

use std::sync::Arc;

/// An immutable single-cycle waveform, cheap to clone and share.
///
/// The first and last points are both part of the cycle: a table of `len`
/// points spans `len - 1` interpolation intervals, so `lookup(0.0)` and
/// `lookup(1.0)` both hit an end point.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTable {
    samples: Arc<[f32]>,
}

impl WaveTable {
    /// Number of points in the built-in tables.
    pub const DEFAULT_LENGTH: usize = 8192;

    /// Wraps precomputed samples.
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// One sine cycle over `len` points, `sin(i / (len - 1) * 2π)`.
    pub fn sine(len: usize) -> Self {
        let last = len.saturating_sub(1).max(1) as f64;
        let samples = (0..len)
            .map(|i| (i as f64 / last * std::f64::consts::TAU).sin() as f32)
            .collect::<Vec<_>>();
        Self::new(samples)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the table holds no points.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The raw points.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linearly interpolated value at `phase` in `[0, 1]`.
    ///
    /// Phases outside the range are clamped. Tables with fewer than two
    /// points return their only point, or silence.
    #[inline]
    pub fn lookup(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        if len < 2 {
            return self.samples.first().copied().unwrap_or(0.0);
        }
        let position = phase.clamp(0.0, 1.0) * (len - 1) as f32;
        let index = (position as usize).min(len - 2);
        let frac = position - index as f32;
        let a = self.samples[index];
        let b = self.samples[index + 1];
        a + (b - a) * frac
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::sine(Self::DEFAULT_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_end_points() {
        let table = WaveTable::sine(WaveTable::DEFAULT_LENGTH);
        assert_eq!(table.len(), 8192);
        assert!(table.lookup(0.0).abs() < 1e-6);
        assert!(table.lookup(1.0).abs() < 1e-4);
        assert!((table.lookup(0.25) - 1.0).abs() < 1e-3);
        assert!((table.lookup(0.75) + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolates_between_points() {
        let table = WaveTable::new(vec![0.0, 1.0, 0.0]);
        assert_eq!(table.lookup(0.25), 0.5);
        assert_eq!(table.lookup(0.5), 1.0);
        assert_eq!(table.lookup(0.75), 0.5);
        assert_eq!(table.lookup(2.0), 0.0);
    }

    #[test]
    fn test_degenerate_tables() {
        assert_eq!(WaveTable::new(Vec::new()).lookup(0.5), 0.0);
        assert_eq!(WaveTable::new(vec![0.3]).lookup(0.9), 0.3);
    }
}
