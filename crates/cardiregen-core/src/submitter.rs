//! Frame submission interface.
//!
//! The orchestrator depends only on this trait; `cardiregen-interaction`
//! provides the HTTP implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{FrameBlob, PhaseResult};

/// Sends one imaging frame to the analysis service.
///
/// Implementations are stateless across calls and never retry: a failure is
/// returned to the caller, which decides whether to go on with the other
/// phase.
#[async_trait]
pub trait FrameSubmitter: Send + Sync {
    /// Submits `blob` to `<endpoint>/analyze` and validates the response.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty blob or unusable endpoint; no request is sent
    /// - `Connectivity`: transport failure, timeout, non-2xx, malformed JSON
    /// - `ResponseShape`: JSON without a numeric `lv_volume_ml`
    async fn submit(&self, blob: &FrameBlob, endpoint: &str) -> Result<PhaseResult>;
}
