//! Cantor Effects - the stages of the vocal chain
//!
//! Mono chain stages ([`Effect`](cantor_core::Effect)):
//!
//! - [`GainStage`] - input gain in dB
//! - [`HighPass`] - toggleable low-cut (10 Hz / 100 Hz)
//! - [`PitchShifter`] - grain-delay pitch shift with dry/wet blend
//! - [`ToneStack`] - low shelf, mid peak, high shelf, air shelf
//! - [`Compressor`] - soft-knee compressor, fixed 3 ms / 250 ms timing
//!
//! Parallel sends ([`StereoSend`](cantor_core::StereoSend)), all tapped after
//! the compressor:
//!
//! - [`ConvolutionReverb`] - synthetic 2 s stereo impulse
//! - [`FeedbackDelay`] - echo with self-feedback
//! - [`HaasWidener`] - 10 ms / 20 ms asymmetric delay of the upper range
//!
//! Every stage exposes target setters that only move smoothed parameters,
//! and a `settle` method that jumps to the targets for initialization.
//!
//! ## Example
//!
//! ```rust
//! use cantor_core::{Effect, StereoSend};
//! use cantor_effects::{Compressor, FeedbackDelay, GainStage};
//!
//! let mut gain = GainStage::new(48000.0);
//! let mut comp = Compressor::new(48000.0);
//! let mut echo = FeedbackDelay::new(48000.0);
//! echo.set_mix(0.2);
//!
//! let x = comp.process(gain.process(0.5));
//! let (l, r) = echo.process_send(x);
//! let master = (x + l, x + r);
//! # let _ = master;
//! ```

pub mod compressor;
pub mod echo;
pub mod filter;
pub mod gain;
pub mod pitch_shifter;
pub mod reverb;
pub mod widener;

pub use compressor::Compressor;
pub use echo::FeedbackDelay;
pub use filter::{HighPass, ToneStack};
pub use gain::GainStage;
pub use pitch_shifter::PitchShifter;
pub use reverb::{ConvolutionReverb, ImpulseResponse};
pub use widener::HaasWidener;
