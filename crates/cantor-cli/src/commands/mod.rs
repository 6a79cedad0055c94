//! CLI command implementations.

pub mod assist;
pub mod common;
pub mod devices;
pub mod live;
pub mod profile;
pub mod render;
pub mod settings;
