//! Application layer: runs analyses over a session.

pub mod analysis_service;
pub mod orchestrator;

pub use analysis_service::AnalysisService;
pub use orchestrator::{AnalysisOrchestrator, StatusUpdate};
