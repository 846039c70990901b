//! Equal-power stereo placement.

use std::f32::consts::FRAC_PI_2;

/// Splits `value` into `(left, right)` with constant power.
///
/// `pan` runs from 0 (hard left) through 0.5 (centre) to 1 (hard right).
///
/// ```
/// use patchwork_processors::sinusoidal_panning;
///
/// let (left, right) = sinusoidal_panning(1.0, 0.5);
/// assert!((left - right).abs() < 1e-6);
/// assert!((left * left + right * right - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn sinusoidal_panning(value: f32, pan: f32) -> (f32, f32) {
    let angle = pan * FRAC_PI_2;
    (value * angle.cos(), value * angle.sin())
}
