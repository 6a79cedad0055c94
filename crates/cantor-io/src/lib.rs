//! Audio I/O layer for the cantor vocal engine.
//!
//! This crate provides:
//!
//! - **Backends**: the object-safe [`AudioBackend`] trait, implemented by
//!   [`CpalBackend`] for real devices and [`OfflineBackend`] for deterministic,
//!   block-by-block driving in tests and offline renders
//! - **Devices**: [`list_devices`] and [`default_device`]
//! - **Decode**: [`decode_file`] and [`decode_bytes`] turn any supported
//!   container (WAV, MP3, FLAC, AAC/MP4, Ogg Vorbis) into a stereo
//!   [`DecodedBuffer`] at the engine rate
//! - **WAV**: [`encode_wav`] and [`write_wav`] for recordings and renders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cantor_io::{decode_file, write_wav};
//!
//! let vocal = decode_file("take.mp3", 48000)?;
//! write_wav("take.wav", vocal.samples(), 2, 48000)?;
//! ```

pub mod backend;
pub mod cpal_backend;
mod decode;
mod device;
pub mod offline;
mod wav;

pub use backend::{
    AudioBackend, BackendStreamConfig, CaptureProcessing, ErrorCallback, InputCallback,
    OutputCallback, StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use decode::{DecodedBuffer, decode_bytes, decode_file, resample_stereo};
pub use device::{AudioDevice, default_device, list_devices};
pub use offline::{OfflineBackend, OfflineDriver};
pub use wav::{WavInfo, encode_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Container could not be probed or decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
