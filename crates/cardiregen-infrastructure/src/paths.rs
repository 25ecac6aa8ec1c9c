//! Path management for CardiRegen configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/cardiregen/        # Config directory (platform config dir)
//! └── config.toml              # Endpoint, timeout and log level
//! ```

use std::path::PathBuf;

use cardiregen_core::error::AnalysisError;

const APP_DIR: &str = "cardiregen";
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform configuration directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for AnalysisError {
    fn from(err: PathError) -> Self {
        AnalysisError::config(err.to_string())
    }
}

/// Resolves CardiRegen's well-known locations.
pub struct CardiregenPaths;

impl CardiregenPaths {
    /// Returns the CardiRegen configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/cardiregen/` on Linux
    /// - `Err(PathError::ConfigDirNotFound)`: no home/config directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}
