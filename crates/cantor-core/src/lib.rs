//! Cantor Core - DSP primitives for the cantor vocal engine
//!
//! The building blocks every node of the vocal graph is made from, designed
//! for real-time processing with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - mono processing stage (gain, filters, pitch, dynamics)
//! - [`StereoSend`] - parallel send from the compressor output to the master bus
//!
//! ## Parameter Automation
//!
//! - [`SmoothedParam`] - exponential approach toward a target, 100 ms default
//!   time constant; the only way a parameter moves while audio flows
//!
//! ## Filters
//!
//! - [`Biquad`] - Direct Form I second-order section
//! - [`highpass_coefficients`], [`peaking_eq_coefficients`],
//!   [`low_shelf_coefficients`], [`high_shelf_coefficients`] - RBJ cookbook
//!
//! ## Time and Modulation
//!
//! - [`InterpolatedDelay`] - circular buffer with fractional reads
//! - [`Phasor`] - signed-frequency sawtooth in `[0, 1)`
//! - [`EnvelopeFollower`] - attack/release peak detector
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! cantor-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod math;
pub mod param;
pub mod phasor;

pub use biquad::{
    Biquad, BiquadCoefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, peaking_eq_coefficients,
};
pub use delay::{InterpolatedDelay, Interpolation};
pub use effect::{Effect, StereoSend};
pub use envelope::EnvelopeFollower;
pub use math::{
    db_to_linear, flush_denormal, lerp, linear_to_db, seconds_to_samples, semitones_to_cents,
    semitones_to_ratio,
};
pub use param::{DEFAULT_TIME_CONSTANT_MS, SmoothedParam};
pub use phasor::Phasor;
