//! Error types for the CardiRegen analysis workflow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::Phase;

/// The shared error type for every CardiRegen crate.
///
/// Variants mirror the failure classes a user can act on. The orchestrator
/// captures all of them into the session status; none of them escape a run.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisError {
    /// Missing endpoint, no frame selected, empty frame, malformed URL.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure: DNS, refused connection, timeout, non-2xx status,
    /// or a body that is not JSON.
    #[error("Connectivity error: {message}")]
    Connectivity {
        message: String,
        /// HTTP status code when the server answered with a non-2xx status.
        status_code: Option<u16>,
    },

    /// The service answered with JSON that lacks a required field.
    #[error("Response shape error: {0}")]
    ResponseShape(String),

    /// The end-diastole volume was zero, so the ejection fraction is undefined.
    #[error("Cannot compute ejection fraction: end-diastole volume is zero")]
    DivisionByZero,

    /// The mesh payload could not be parsed. Soft failure, logged only.
    #[error("Mesh parse error: {0}")]
    MeshParse(String),

    /// A run was requested while another run on the same session is active.
    #[error("An analysis run is already in progress")]
    RunInProgress,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (reading frame files, config files)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl AnalysisError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Connectivity error without an HTTP status
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a Connectivity error for a non-2xx HTTP status
    pub fn http_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Creates a ResponseShape error
    pub fn response_shape(message: impl Into<String>) -> Self {
        Self::ResponseShape(message.into())
    }

    /// Creates a MeshParse error
    pub fn mesh_parse(message: impl Into<String>) -> Self {
        Self::MeshParse(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Connectivity error
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Check if this is a ResponseShape error
    pub fn is_response_shape(&self) -> bool {
        matches!(self, Self::ResponseShape(_))
    }

    /// Check if this is a DivisionByZero error
    pub fn is_division_by_zero(&self) -> bool {
        matches!(self, Self::DivisionByZero)
    }

    /// Check if this is a MeshParse error
    pub fn is_mesh_parse(&self) -> bool {
        matches!(self, Self::MeshParse(_))
    }

    /// Short, log-friendly classification of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connectivity { .. } => "connectivity",
            Self::ResponseShape(_) => "response_shape",
            Self::DivisionByZero => "division_by_zero",
            Self::MeshParse(_) => "mesh_parse",
            Self::RunInProgress => "run_in_progress",
            Self::Config(_) => "config",
            Self::Io { .. } => "io",
        }
    }

    /// Terse message suitable for showing to the end user.
    ///
    /// Connectivity and response-shape failures share one message; the
    /// distinction only matters in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Connectivity { .. } | Self::ResponseShape(_) => {
                "Connection failed. Check the endpoint URL and that the analysis service is running."
                    .to_string()
            }
            Self::DivisionByZero => {
                "Ejection fraction unavailable: end-diastole volume is zero.".to_string()
            }
            Self::MeshParse(_) => "3D mesh could not be displayed.".to_string(),
            Self::RunInProgress => "An analysis is already running.".to_string(),
            Self::Config(message) => format!("Configuration problem: {message}"),
            Self::Io { message } => message.clone(),
        }
    }
}

/// Why a run ended in `Failed`: the error and, when it is tied to one,
/// the phase whose submission produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    pub phase: Option<Phase>,
    pub error: AnalysisError,
}

impl FailureReason {
    pub fn new(phase: Option<Phase>, error: AnalysisError) -> Self {
        Self { phase, error }
    }

    pub fn for_phase(phase: Phase, error: AnalysisError) -> Self {
        Self::new(Some(phase), error)
    }

    pub fn session(error: AnalysisError) -> Self {
        Self::new(None, error)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{phase}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Connectivity {
            message: format!("Malformed JSON response: {err}"),
            status_code: None,
        }
    }
}

impl From<toml::de::Error> for AnalysisError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A type alias for `Result<T, AnalysisError>`.
pub type Result<T> = std::result::Result<T, AnalysisError>;
