//! Convolution reverb against a synthetic stereo impulse response.
//!
//! The impulse is white noise per channel shaped by `(1 − n/len)^decay`
//! (decay 2.0, 2 s long), built once when the reverb is created. It is then
//! scaled the way a normalizing convolver scales any impulse: to a fixed
//! power of -58 dB at 44.1 kHz, independent of the noise realization.
//!
//! # Convolution
//!
//! Uniformly partitioned, zero latency:
//!
//! ```text
//! head: taps [0, B)        direct-form dot product, per sample
//! tail: taps [B, len)      overlap-save, one FFT per B input samples,
//!                          frequency-domain delay line of input spectra
//! ```
//!
//! With `B = 256` the per-block work is one forward FFT, two spectral
//! multiply-accumulates over the partitions and two inverse FFTs.

use std::sync::Arc;

use cantor_core::{SmoothedParam, StereoSend, db_to_linear};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Impulse length in seconds.
pub const IMPULSE_SECONDS: f32 = 2.0;
/// Envelope exponent of the impulse.
pub const IMPULSE_DECAY: f32 = 2.0;
/// Partition size in samples.
const BLOCK: usize = 256;
/// Normalized impulse power.
const CALIBRATION_DB: f32 = -58.0;
const CALIBRATION_RATE: f32 = 44_100.0;

/// A stereo impulse response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    /// Left channel taps
    pub left: Vec<f32>,
    /// Right channel taps
    pub right: Vec<f32>,
}

impl ImpulseResponse {
    /// Enveloped white noise, independent per channel.
    ///
    /// `seed` selects the noise realization; the same seed always yields the
    /// same impulse.
    pub fn synthetic(sample_rate: f32, seconds: f32, decay: f32, seed: u32) -> Self {
        let len = ((sample_rate * seconds) as usize).max(1);
        let mut state = seed;
        let mut noise = move || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
        };

        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for n in 0..len {
            let envelope = libm::powf(1.0 - n as f32 / len as f32, decay);
            left.push(noise() * envelope);
            right.push(noise() * envelope);
        }
        Self { left, right }
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when the impulse has no taps.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// RMS over both channels.
    pub fn rms(&self) -> f32 {
        let count = (self.left.len() + self.right.len()).max(1);
        let power: f64 = self
            .left
            .iter()
            .chain(&self.right)
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        (power / count as f64).sqrt() as f32
    }

    /// Scale to the calibrated power for `sample_rate`.
    pub fn normalize(&mut self, sample_rate: f32) {
        let rms = self.rms();
        if rms <= 0.0 {
            return;
        }
        let scale = db_to_linear(CALIBRATION_DB) * (CALIBRATION_RATE / sample_rate) / rms;
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= scale;
        }
    }
}

/// Zero-latency uniformly partitioned convolver, mono in, stereo out.
struct PartitionedConvolver {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    /// Head taps per channel, reversed for a forward dot product.
    head: [Vec<f32>; 2],
    /// Spectra of tail partitions 1.. per channel, `BLOCK + 1` bins each.
    partitions: [Vec<Vec<Complex<f32>>>; 2],
    /// Input history, doubled so the head window is contiguous.
    history: Vec<f32>,
    history_pos: usize,
    /// `[previous block, current block]` input frame.
    frame: Vec<f32>,
    fill: usize,
    /// Input spectra, newest at `fdl_pos`.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_pos: usize,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    /// Tail output for the block in progress.
    tail: [Vec<f32>; 2],
}

impl PartitionedConvolver {
    fn new(ir: &ImpulseResponse) -> Self {
        let n = 2 * BLOCK;
        let bins = BLOCK + 1;
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut fft_scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let head_of = |taps: &[f32]| {
            let mut head = vec![0.0; BLOCK];
            for (k, &h) in taps.iter().take(BLOCK).enumerate() {
                head[BLOCK - 1 - k] = h;
            }
            head
        };

        let mut partition_spectra = |taps: &[f32]| {
            taps.chunks(BLOCK)
                .skip(1)
                .map(|chunk| {
                    let mut buf = vec![Complex::new(0.0, 0.0); n];
                    for (slot, &h) in buf.iter_mut().zip(chunk) {
                        slot.re = h;
                    }
                    forward.process_with_scratch(&mut buf, &mut fft_scratch);
                    buf.truncate(bins);
                    buf
                })
                .collect::<Vec<_>>()
        };
        let partitions = [partition_spectra(&ir.left), partition_spectra(&ir.right)];
        let tail_count = partitions[0].len().max(partitions[1].len());

        Self {
            head: [head_of(&ir.left), head_of(&ir.right)],
            partitions,
            history: vec![0.0; 2 * BLOCK],
            history_pos: 0,
            frame: vec![0.0; n],
            fill: 0,
            fdl: vec![vec![Complex::new(0.0, 0.0); bins]; tail_count],
            fdl_pos: 0,
            spectrum: vec![Complex::new(0.0, 0.0); n],
            accum: vec![Complex::new(0.0, 0.0); bins],
            tail: [vec![0.0; BLOCK], vec![0.0; BLOCK]],
            forward,
            inverse,
            fft_scratch,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> (f32, f32) {
        let pos = self.history_pos;
        self.history[pos] = input;
        self.history[pos + BLOCK] = input;
        let window = &self.history[pos + 1..=pos + BLOCK];
        self.history_pos = (pos + 1) % BLOCK;

        let dot = |head: &[f32]| head.iter().zip(window).map(|(h, x)| h * x).sum::<f32>();
        let left = dot(&self.head[0]) + self.tail[0][self.fill];
        let right = dot(&self.head[1]) + self.tail[1][self.fill];

        self.frame[BLOCK + self.fill] = input;
        self.fill += 1;
        if self.fill == BLOCK {
            self.fill = 0;
            self.advance_block();
        }

        (left, right)
    }

    fn advance_block(&mut self) {
        let n = 2 * BLOCK;
        if self.fdl.is_empty() {
            self.frame.copy_within(BLOCK.., 0);
            return;
        }

        for (slot, &x) in self.spectrum.iter_mut().zip(&self.frame) {
            *slot = Complex::new(x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);

        let slots = self.fdl.len();
        self.fdl_pos = (self.fdl_pos + 1) % slots;
        self.fdl[self.fdl_pos].copy_from_slice(&self.spectrum[..=BLOCK]);

        let scale = 1.0 / n as f32;
        for ch in 0..2 {
            self.accum.fill(Complex::new(0.0, 0.0));
            for (j, h) in self.partitions[ch].iter().enumerate() {
                let x = &self.fdl[(self.fdl_pos + slots - j) % slots];
                for ((acc, &xk), &hk) in self.accum.iter_mut().zip(x).zip(h) {
                    *acc += xk * hk;
                }
            }

            self.spectrum[..=BLOCK].copy_from_slice(&self.accum);
            for k in 1..BLOCK {
                self.spectrum[n - k] = self.accum[k].conj();
            }
            self.inverse
                .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);

            for (out, c) in self.tail[ch].iter_mut().zip(&self.spectrum[BLOCK..]) {
                *out = c.re * scale;
            }
        }

        self.frame.copy_within(BLOCK.., 0);
    }

    fn clear(&mut self) {
        self.history.fill(0.0);
        self.history_pos = 0;
        self.frame.fill(0.0);
        self.fill = 0;
        for spectrum in &mut self.fdl {
            spectrum.fill(Complex::new(0.0, 0.0));
        }
        for tail in &mut self.tail {
            tail.fill(0.0);
        }
    }
}

/// Reverb send: convolution with the synthetic impulse, scaled by the mix.
///
/// While the mix rests at zero the convolver is suspended and outputs
/// silence; its state is cleared on the way in, so a later send starts from
/// an empty room.
pub struct ConvolutionReverb {
    convolver: PartitionedConvolver,
    mix: SmoothedParam,
    suspended: bool,
}

impl ConvolutionReverb {
    /// Reverb with the default synthetic impulse, mix 0.
    pub fn new(sample_rate: f32) -> Self {
        let mut ir = ImpulseResponse::synthetic(sample_rate, IMPULSE_SECONDS, IMPULSE_DECAY, 0x5EED);
        ir.normalize(sample_rate);
        Self::with_impulse(sample_rate, &ir)
    }

    /// Reverb convolving with `ir` as given.
    pub fn with_impulse(sample_rate: f32, ir: &ImpulseResponse) -> Self {
        Self {
            convolver: PartitionedConvolver::new(ir),
            mix: SmoothedParam::automation(0.0, sample_rate),
            suspended: false,
        }
    }

    /// Target send level.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix);
    }

    /// Target send level.
    pub fn mix(&self) -> f32 {
        self.mix.target()
    }

    /// Jump to the target. Only before the send carries signal.
    pub fn settle(&mut self) {
        self.mix.snap_to_target();
    }
}

impl std::fmt::Debug for ConvolutionReverb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionReverb")
            .field("mix", &self.mix)
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}

impl StereoSend for ConvolutionReverb {
    #[inline]
    fn process_send(&mut self, input: f32) -> (f32, f32) {
        let mix = self.mix.advance();
        if mix == 0.0 && self.mix.is_settled() {
            if !self.suspended {
                self.convolver.clear();
                self.suspended = true;
            }
            return (0.0, 0.0);
        }
        self.suspended = false;

        let (l, r) = self.convolver.process(input);
        (l * mix, r * mix)
    }

    fn reset(&mut self) {
        self.convolver.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(taps: &[f32], input: &[f32]) -> Vec<f32> {
        (0..input.len())
            .map(|n| {
                (0..taps.len().min(n + 1))
                    .map(|k| taps[k] * input[n - k])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn impulse_envelope_decays() {
        let ir = ImpulseResponse::synthetic(48000.0, 2.0, 2.0, 7);
        assert_eq!(ir.len(), 96_000);
        let early: f32 = ir.left[..4800].iter().map(|s| s * s).sum();
        let late: f32 = ir.left[86_400..91_200].iter().map(|s| s * s).sum();
        assert!(late < early * 0.01);
        assert_ne!(ir.left, ir.right);
    }

    #[test]
    fn normalization_fixes_power() {
        let mut ir = ImpulseResponse::synthetic(48000.0, 2.0, 2.0, 99);
        ir.normalize(48000.0);
        let expected = db_to_linear(CALIBRATION_DB) * CALIBRATION_RATE / 48000.0;
        assert!((ir.rms() - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn partitioned_matches_direct_convolution() {
        let ir = ImpulseResponse::synthetic(8000.0, 0.2, 2.0, 3);
        let input: Vec<f32> = (0..3000)
            .map(|i| if i % 397 == 0 { 1.0 } else { (i as f32 * 0.37).sin() * 0.2 })
            .collect();

        let mut reverb = ConvolutionReverb::with_impulse(48000.0, &ir);
        reverb.set_mix(1.0);
        reverb.settle();
        let (left, right): (Vec<f32>, Vec<f32>) =
            input.iter().map(|&x| reverb.process_send(x)).unzip();

        let want_l = naive(&ir.left, &input);
        let want_r = naive(&ir.right, &input);
        for n in 0..input.len() {
            assert!((left[n] - want_l[n]).abs() < 1e-3, "left[{n}]");
            assert!((right[n] - want_r[n]).abs() < 1e-3, "right[{n}]");
        }
    }

    #[test]
    fn silent_at_zero_mix() {
        let mut reverb = ConvolutionReverb::new(48000.0);
        for _ in 0..1000 {
            assert_eq!(reverb.process_send(1.0), (0.0, 0.0));
        }
    }

    #[test]
    fn resumes_from_empty_state() {
        let ir = ImpulseResponse::synthetic(8000.0, 0.1, 2.0, 11);
        let mut reverb = ConvolutionReverb::with_impulse(48000.0, &ir);
        reverb.set_mix(1.0);
        reverb.settle();
        for _ in 0..500 {
            reverb.process_send(0.5);
        }
        reverb.set_mix(0.0);
        reverb.settle();
        reverb.process_send(0.0);
        reverb.set_mix(1.0);
        reverb.settle();
        let (l, r) = reverb.process_send(0.0);
        assert_eq!((l, r), (0.0, 0.0));
    }
}
