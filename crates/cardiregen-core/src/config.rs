use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Default request timeout in seconds. GPU inference behind a tunnel is slow.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Root configuration read from `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the analysis service, e.g. an ngrok tunnel.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Rejects values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(AnalysisError::config(
                "request_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}
