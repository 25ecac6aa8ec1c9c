//! The two-phase analysis run.

use std::sync::Arc;

use cardiregen_core::error::{AnalysisError, FailureReason};
use cardiregen_core::session::{Session, SessionStatus};
use cardiregen_core::submitter::FrameSubmitter;
use tokio::sync::mpsc;

/// Status transition published while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub session_id: String,
    pub status: SessionStatus,
}

/// Sequences frame submissions for a session and derives the ejection
/// fraction.
///
/// Failure policy is best-effort: a failed phase is recorded and the next
/// selected phase is still attempted. Phases run strictly one after the
/// other, ED before ES.
pub struct AnalysisOrchestrator {
    submitter: Arc<dyn FrameSubmitter>,
    status_sender: Option<mpsc::UnboundedSender<StatusUpdate>>,
}

impl AnalysisOrchestrator {
    pub fn new(submitter: Arc<dyn FrameSubmitter>) -> Self {
        Self {
            submitter,
            status_sender: None,
        }
    }

    /// Publishes every status transition on `sender`.
    pub fn with_status_channel(mut self, sender: mpsc::UnboundedSender<StatusUpdate>) -> Self {
        self.status_sender = Some(sender);
        self
    }

    /// Runs the analysis for every selected phase and returns the updated
    /// session.
    ///
    /// Never fails: validation errors, per-phase failures and metric errors
    /// all end up in `session.status`. Results of successful phases are kept
    /// even when the other phase fails, and a failed phase keeps whatever
    /// result it had from an earlier run.
    pub async fn run(&self, session: Session) -> Session {
        self.run_observed(session, None).await
    }

    /// Like [`run`](Self::run), additionally publishing every status
    /// transition on `observer` before the step it announces starts.
    pub async fn run_with_observer(
        &self,
        session: Session,
        observer: &mpsc::UnboundedSender<StatusUpdate>,
    ) -> Session {
        self.run_observed(session, Some(observer)).await
    }

    async fn run_observed(
        &self,
        mut session: Session,
        observer: Option<&mpsc::UnboundedSender<StatusUpdate>>,
    ) -> Session {
        tracing::info!(
            session_id = %session.id,
            endpoint = %session.endpoint(),
            phases = ?session.selected_phases(),
            "Starting analysis run"
        );

        if let Err(error) = Self::check_preconditions(&session) {
            tracing::warn!(session_id = %session.id, kind = error.kind(), %error, "Run rejected");
            self.transition(
                &mut session,
                SessionStatus::Failed(FailureReason::session(error)),
                observer,
            );
            session.touch();
            return session;
        }

        let mut last_failure: Option<FailureReason> = None;

        for phase in session.selected_phases() {
            self.transition(&mut session, SessionStatus::Running(phase), observer);

            let outcome = match session.selection(phase) {
                Some(blob) => self.submitter.submit(blob, session.endpoint()).await,
                None => continue,
            };

            match outcome {
                Ok(result) => {
                    tracing::info!(
                        session_id = %session.id,
                        %phase,
                        volume_ml = result.volume_ml,
                        has_mesh = result.mesh_payload.is_some(),
                        "Phase analysed"
                    );
                    session.record_result(phase, result);
                }
                Err(error) => {
                    tracing::warn!(
                        session_id = %session.id,
                        %phase,
                        kind = error.kind(),
                        %error,
                        "Phase submission failed"
                    );
                    last_failure = Some(FailureReason::for_phase(phase, error));
                }
            }
        }

        // The metric tracks the current results, including ones kept from
        // earlier runs.
        if let Some(error) = session.metric_error() {
            last_failure = Some(FailureReason::session(error.clone()));
        }

        let final_status = match last_failure {
            Some(reason) => SessionStatus::Failed(reason),
            None => SessionStatus::Succeeded,
        };
        self.transition(&mut session, final_status, observer);
        session.touch();

        tracing::info!(
            session_id = %session.id,
            derived_metric = ?session.derived_metric(),
            status = %session.status.describe(),
            "Analysis run finished"
        );
        session
    }

    fn check_preconditions(session: &Session) -> Result<(), AnalysisError> {
        if session.endpoint().is_empty() {
            return Err(AnalysisError::validation(
                "Please provide the analysis service URL.",
            ));
        }
        if session.selections.is_empty() {
            return Err(AnalysisError::validation(
                "Please select at least one frame (ED or ES).",
            ));
        }
        Ok(())
    }

    fn transition(
        &self,
        session: &mut Session,
        status: SessionStatus,
        observer: Option<&mpsc::UnboundedSender<StatusUpdate>>,
    ) {
        tracing::debug!(session_id = %session.id, from = ?session.status, to = ?status, "Status transition");
        session.status = status.clone();

        let update = StatusUpdate {
            session_id: session.id.clone(),
            status,
        };
        // Receivers may be gone; progress reporting is optional.
        for sender in self.status_sender.iter().chain(observer) {
            let _ = sender.send(update.clone());
        }
    }
}
