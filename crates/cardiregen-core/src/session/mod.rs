//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session state (`Session`, `FrameBlob`, `PhaseResult`, `SessionStatus`)
//! - `endpoint`: Endpoint normalization and analyze URL construction

mod endpoint;
mod model;

pub use endpoint::{ANALYZE_PATH, analyze_url, normalize_endpoint};
pub use model::{FrameBlob, PhaseResult, Session, SessionStatus};
