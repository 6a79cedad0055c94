//! Processing traits for the nodes of the vocal graph.
//!
//! The chain from input gain through the compressor is mono, so every stage
//! there implements [`Effect`]. The parallel sends after the compressor turn
//! one mono sample into a stereo contribution to the master bus and
//! implement [`StereoSend`].
//!
//! Both traits are object-safe and allocation-free on the audio path.

/// A mono-in, mono-out processing stage.
///
/// # Example
///
/// ```rust
/// use cantor_core::Effect;
///
/// struct Invert;
///
/// impl Effect for Invert {
///     fn process(&mut self, input: f32) -> f32 {
///         -input
///     }
///
///     fn reset(&mut self) {}
/// }
///
/// let mut block = [0.5, -0.25];
/// Invert.process_block_inplace(&mut block);
/// assert_eq!(block, [-0.5, 0.25]);
/// ```
pub trait Effect {
    /// Process one sample, advancing all internal state (including parameter
    /// smoothers) by one tick.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear signal state (delay lines, filter history) without touching
    /// parameters.
    fn reset(&mut self);

    /// Processing latency in samples.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// A parallel send: mono in, stereo contribution out.
pub trait StereoSend {
    /// Process one sample, returning the `(left, right)` contribution to the
    /// master bus, already scaled by the send level.
    fn process_send(&mut self, input: f32) -> (f32, f32);

    /// Clear signal state without touching parameters.
    fn reset(&mut self);
}
