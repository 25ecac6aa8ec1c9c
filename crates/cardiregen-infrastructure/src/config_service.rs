//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml` and applies the
//! `CARDIREGEN_ENDPOINT` environment override.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use cardiregen_core::config::AppConfig;
use cardiregen_core::error::{AnalysisError, Result};

use crate::paths::CardiregenPaths;

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "CARDIREGEN_ENDPOINT";

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service for the default config location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(CardiregenPaths::config_file()?))
    }

    /// Creates a service reading an explicit file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults. The environment override is
    /// applied on every call.
    pub fn get_config(&self) -> Result<AppConfig> {
        let cached = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let config = match cached {
            Some(config) => config,
            None => {
                let loaded = Self::load_from(&self.path)?;
                *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
                loaded
            }
        };

        Ok(apply_endpoint_override(config, std::env::var(ENDPOINT_ENV).ok()))
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn load_from(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|err| {
            AnalysisError::io(format!("Failed to read {}: {err}", path.display()))
        })?;
        let config: AppConfig = toml::from_str(&content).map_err(|err| {
            AnalysisError::config(format!("Failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}

/// Replaces the configured endpoint with `env_endpoint` when it is set and
/// not blank.
pub fn apply_endpoint_override(mut config: AppConfig, env_endpoint: Option<String>) -> AppConfig {
    if let Some(endpoint) = env_endpoint.filter(|value| !value.trim().is_empty()) {
        config.endpoint = Some(endpoint);
    }
    config
}
