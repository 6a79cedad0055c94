//! Engine and preset-assistant errors.

use cantor_config::LatencyMode;
use thiserror::Error;

/// Failures surfaced by [`Engine`](crate::Engine) operations.
///
/// Operations that find nothing loaded or nothing active are not errors:
/// they return `Ok(())` and change nothing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The microphone could not be opened. No source was changed.
    #[error("microphone acquisition failed: {0}")]
    Acquisition(#[source] cantor_io::Error),

    /// An imported file could not be decoded. The previous buffer for that
    /// role is still loaded.
    #[error("decode failed: {0}")]
    Decode(#[source] cantor_io::Error),

    /// Rebuilding the graph for a new latency mode failed. The engine is
    /// unbuilt and still reports its previous mode.
    #[error("rebuild for {mode} latency failed: {source}")]
    Rebuild {
        /// The mode that was requested
        mode: LatencyMode,
        /// Backend failure
        #[source]
        source: cantor_io::Error,
    },

    /// The output stream could not be built.
    #[error("audio backend error: {0}")]
    Backend(#[from] cantor_io::Error),

    /// The recorder's collector thread could not be started. Nothing is
    /// being captured.
    #[error("could not start the recorder: {0}")]
    Recorder(#[source] std::io::Error),
}

/// Failures from [`request_settings`](crate::request_settings).
#[derive(Debug, Error)]
pub enum AssistError {
    /// Every attempt failed with a transient error.
    #[error("preset service unavailable after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Message of the final failure
        last: String,
    },

    /// The service refused the request.
    #[error("preset service rejected the request: {0}")]
    Rejected(String),

    /// The response was not a settings object.
    #[error("malformed preset response: {0}")]
    Malformed(String),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
