//! Domain layer of CardiRegen: the analysis session, its error taxonomy,
//! the ejection-fraction calculator and mesh normalization.

pub mod config;
pub mod error;
pub mod mesh;
pub mod metric;
pub mod phase;
pub mod report;
pub mod session;
pub mod submitter;

// Re-export common types
pub use error::{AnalysisError, FailureReason};
pub use phase::Phase;
pub use session::{FrameBlob, PhaseResult, Session, SessionStatus};
pub use submitter::FrameSubmitter;
