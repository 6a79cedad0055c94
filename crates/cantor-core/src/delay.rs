//! Circular-buffer delay line with fractional reads.
//!
//! Used by the echo send, the Haas widener, the pitch shifter's two grain
//! lines and the monitor sync delay.
//!
//! | User | Capacity | Modulated |
//! |------|----------|-----------|
//! | Echo send | 2 s | No (smoothed time) |
//! | Pitch shifter grains | 1 s | Yes (sawtooth) |
//! | Haas widener | 20 ms | No |
//! | Monitor sync | 1 s | No (smoothed time) |

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Interpolation method for fractional delay reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Truncate to the nearest older sample
    None,
    /// Linear interpolation between two samples
    #[default]
    Linear,
}

/// Heap-allocated delay line.
///
/// `read(d)` returns the sample written `d` writes ago, counting the most
/// recent write as `d = 0`. Write-then-read therefore gives a zero-latency
/// tap at `d = 0`; read-then-write gives an exact `d + 1` sample delay.
///
/// # Example
///
/// ```rust
/// use cantor_core::InterpolatedDelay;
///
/// let mut delay = InterpolatedDelay::from_time(48000.0, 0.05);
/// delay.write(1.0);
/// assert_eq!(delay.read(0.0), 1.0);
/// delay.write(0.0);
/// assert_eq!(delay.read(1.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    interpolation: Interpolation,
}

impl InterpolatedDelay {
    /// Creates a delay line holding `max_delay_samples` samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay_samples` is 0.
    pub fn new(max_delay_samples: usize) -> Self {
        assert!(max_delay_samples > 0, "Delay size must be > 0");

        Self {
            buffer: vec![0.0; max_delay_samples],
            write_pos: 0,
            interpolation: Interpolation::Linear,
        }
    }

    /// Creates a delay line able to hold `max_seconds` of audio.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 2;
        Self::new(max_samples)
    }

    /// Sets the interpolation method.
    pub fn set_interpolation(&mut self, interp: Interpolation) {
        self.interpolation = interp;
    }

    /// Largest delay, in samples, that [`read`](Self::read) honors.
    #[inline]
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    /// Reads a delayed sample; delays beyond [`max_delay`](Self::max_delay)
    /// are clamped.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(0.0, self.max_delay());

        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        // Most recent write sits at write_pos - 1.
        let newer = (self.write_pos + len - delay_int - 1) % len;

        match self.interpolation {
            Interpolation::None => self.buffer[newer],
            Interpolation::Linear => {
                let older = (newer + len - 1) % len;
                let a = self.buffer[newer];
                let b = self.buffer[older];
                a + (b - a) * frac
            }
        }
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Clears the buffer to silence.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Buffer length in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
