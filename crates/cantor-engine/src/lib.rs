//! Live vocal-processing engine.
//!
//! One fixed topology, built per engine instance:
//!
//! ```text
//! mic / vocal file → gain → low-cut → pitch → tone → compressor → {dry, reverb, echo, width}
//!                                                                         ↓
//! backing file ─────────────────────────────────────────────────────→ master bus
//!                                                                         ↓
//!                                                      {monitor output, recorder, analyser tap}
//! ```
//!
//! - [`Engine`]: lifecycle (unbuilt → built), settings, sources, sinks and
//!   latency-mode rebuilds over any [`cantor_io::AudioBackend`]
//! - [`VocalGraph`]: the node set itself, usable without a backend
//! - [`VisualizationTap`] and [`ProfileHandle`]: analyser reads and
//!   spectral fingerprints of the master mix
//! - [`PresetRequest`] and [`request_settings`]: the boundary to an external
//!   preset generator, with bounded retries
//!
//! ## Example
//!
//! ```rust
//! use cantor_config::{EngineConfig, Settings};
//! use cantor_engine::{Engine, FileRole};
//! use cantor_io::{DecodedBuffer, OfflineBackend};
//!
//! let (backend, driver) = OfflineBackend::new();
//! let mut engine = Engine::new(Box::new(backend), EngineConfig::default());
//!
//! let tone: Vec<f32> = (0..4800).map(|n| (n as f32 * 0.05).sin() * 0.3).collect();
//! engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&tone, 48000));
//! engine.apply_settings(&Settings { pitch_shift: 3.0, autotune_amount: 1.0, ..Settings::default() });
//! engine.play_vocal(true).unwrap();
//!
//! let out = driver.render_blocks(8);
//! assert_eq!(out.len(), 8 * 128 * 2);
//! ```

pub mod assistant;
pub mod engine;
pub mod error;
pub mod graph;
mod processor;
pub mod profiler;
pub mod recorder;
pub mod source;
pub mod tap;

pub use assistant::{
    PresetRequest, PresetService, RetryPolicy, SYSTEM_INSTRUCTION, ServiceError, parse_response,
    request_settings, response_schema,
};
pub use engine::{Engine, MIC_QUEUE, PlaybackOptions};
pub use error::{AssistError, EngineError, Result};
pub use graph::{GraphFrame, GraphTargets, MAX_MONITOR_DELAY, VocalGraph};
pub use profiler::{PROFILE_INTERVAL, ProfileHandle, ProfileStep, SpectralProfiler, sample_count};
pub use recorder::Recording;
pub use source::{ActiveSource, FileRole};
pub use tap::VisualizationTap;

pub use cantor_analysis::SpectralFingerprint;
pub use cantor_config::{EngineConfig, LatencyMode, Settings};
