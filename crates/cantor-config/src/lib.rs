//! Configuration for the cantor vocal engine.
//!
//! - [`Settings`]: the full snapshot of every vocal-chain control, with the
//!   [`Scale`] and [`MusicalKey`] tags, JSON/TOML serialization and range
//!   validation
//! - [`EngineConfig`]: sample rate, [`LatencyMode`], devices and profiling
//!   length, loaded from `engine.toml`
//! - [`paths`]: platform configuration directories
//!
//! # Example
//!
//! ```rust,no_run
//! use cantor_config::{EngineConfig, Settings};
//!
//! let config = EngineConfig::load_default()?;
//! let settings = Settings::load("warm_broadcast.toml")?;
//! settings.validate()?;
//! # Ok::<(), cantor_config::ConfigError>(())
//! ```

mod engine_config;
mod error;
mod settings;

/// Platform configuration paths.
pub mod paths;

/// Range validation.
pub mod validation;

pub use engine_config::{EngineConfig, LatencyMode, MONITOR_DELAY_RANGE_MS};
pub use error::ConfigError;
pub use paths::{engine_config_path, ensure_user_config_dir, user_config_dir};
pub use settings::{MusicalKey, Scale, Settings};
pub use validation::{FieldRange, ValidationError, ValidationResult};
