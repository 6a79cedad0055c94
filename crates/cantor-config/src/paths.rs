//! Platform configuration paths.
//!
//! - Linux: `~/.config/cantor/`
//! - macOS: `~/Library/Application Support/cantor/`
//! - Windows: `%APPDATA%\cantor\`

use crate::ConfigError;
use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "cantor";

/// Engine configuration file name.
pub const ENGINE_CONFIG_FILE: &str = "engine.toml";

/// User configuration directory, `./cantor` when the platform has none.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default engine configuration file.
pub fn engine_config_path() -> PathBuf {
    user_config_dir().join(ENGINE_CONFIG_FILE)
}

/// Create the user configuration directory if needed.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced() {
        assert!(user_config_dir().ends_with("cantor"));
        let engine = engine_config_path();
        assert!(engine.ends_with("cantor/engine.toml") || engine.ends_with("cantor\\engine.toml"));
    }
}
