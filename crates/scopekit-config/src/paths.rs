//! Platform-specific location of the configuration file.
//!
//! - Linux: `~/.config/scopekit/scopekit.toml`
//! - macOS: `~/Library/Application Support/scopekit/scopekit.toml`
//! - Windows: `%APPDATA%\scopekit\scopekit.toml`

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "scopekit";

/// File name of the configuration inside [`user_config_dir`].
pub const CONFIG_FILE_NAME: &str = "scopekit.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory when the platform has none.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Resolve an explicit path, or fall back to [`default_config_path`].
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_config_path, Path::to_path_buf)
}

/// Ensure the user config directory exists.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}
