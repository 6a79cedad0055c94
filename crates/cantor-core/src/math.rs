//! Level, pitch and time conversions used across the vocal chain.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - dB and linear gain
//! - [`semitones_to_ratio`] / [`semitones_to_cents`] - pitch intervals
//! - [`seconds_to_samples`] - time conversion
//! - [`flush_denormal`] - keep feedback loops out of subnormal range
//! - [`lerp`] - linear interpolation

use libm::{expf, exp2f, logf};

/// Convert decibels to linear gain: `10^(dB/20)`.
///
/// ```rust
/// use cantor_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels, floored at -200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Frequency ratio of an interval in equal temperament: `2^(st/12)`.
///
/// ```rust
/// use cantor_core::semitones_to_ratio;
///
/// assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-6);
/// assert_eq!(semitones_to_ratio(0.0), 1.0);
/// ```
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Detune in cents for a semitone offset.
#[inline]
pub fn semitones_to_cents(semitones: f32) -> f32 {
    semitones * 100.0
}

/// Seconds to (fractional) samples.
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> f32 {
    seconds * sample_rate
}

/// Replace values below 1e-20 with zero.
///
/// Use in feedback loops where signal can decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Linear interpolation from `a` to `b` by `t`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
