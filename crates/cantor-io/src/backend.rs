//! Pluggable audio backend abstraction.
//!
//! The engine never talks to a platform audio API directly. It asks an
//! [`AudioBackend`] for an output stream (the engine's render callback) and,
//! while a microphone is the active source, an input stream. Two backends ship
//! with the crate:
//!
//! ```text
//!              ┌──────────────────────┐
//!              │  AudioBackend trait  │
//!              └──────────┬───────────┘
//!           ┌─────────────┴─────────────┐
//!           ▼                           ▼
//!   ┌───────────────┐          ┌─────────────────┐
//!   │  CpalBackend  │          │ OfflineBackend  │
//!   │ ALSA/CoreAudio│          │ driven by hand  │
//!   │    /WASAPI    │          │ (tests, render) │
//!   └───────────────┘          └─────────────────┘
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe and the engine
//! can hold a `Box<dyn AudioBackend>`. Streams come back as [`StreamHandle`],
//! which stops the stream when dropped.

use crate::{AudioDevice, Result};

/// Capture-side signal processing a backend may apply before the engine sees
/// the samples.
///
/// The vocal chain does its own gain, filtering and dynamics, so the engine
/// always asks for a raw stream: every flag is `false` by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureProcessing {
    /// Acoustic echo cancellation.
    pub echo_cancellation: bool,
    /// Noise suppression.
    pub noise_suppression: bool,
    /// Automatic gain control.
    pub auto_gain_control: bool,
}

impl CaptureProcessing {
    /// No processing at all.
    pub const RAW: Self = Self {
        echo_cancellation: false,
        noise_suppression: false,
        auto_gain_control: false,
    };

    /// True when no processing is requested.
    pub fn is_raw(&self) -> bool {
        *self == Self::RAW
    }
}

/// Configuration for building an audio stream.
///
/// - `sample_rate`: requested sample rate in Hz (default 48000)
/// - `buffer_size`: preferred buffer size in frames, set by the latency mode
/// - `channels`: interleaved channel count
/// - `device_name`: optional device name filter (system default if `None`)
/// - `processing`: capture processing, meaningful for input streams only
#[derive(Debug, Clone, PartialEq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Optional device name (uses system default if `None`).
    pub device_name: Option<String>,
    /// Capture processing for input streams.
    pub processing: CaptureProcessing,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 128,
            channels: 2,
            device_name: None,
            processing: CaptureProcessing::RAW,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback or capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until the handle is
    /// dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback, run on the audio thread.
///
/// Fills a buffer of interleaved f32 samples, `frames * channels` long.
/// Must not allocate, block or log.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Input callback, run on the audio thread with captured interleaved samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback, called with a human-readable message when the stream fails.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend.
///
/// Object-safe: callbacks are boxed and stream handles are type-erased, so a
/// backend can be chosen at runtime and owned as `Box<dyn AudioBackend>`.
pub trait AudioBackend: Send {
    /// Human-readable backend name, e.g. `"cpal"` or `"offline"`.
    fn name(&self) -> &str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Default input device, if any.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build and start an input stream.
    ///
    /// Backends that cannot honor `config.processing` capture raw and log it;
    /// the engine only ever requests [`CaptureProcessing::RAW`].
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Sample rate the backend will actually run at for `config`.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
