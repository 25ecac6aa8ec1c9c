use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cardiregen_core::error::{AnalysisError, Result};
use cardiregen_core::phase::Phase;
use cardiregen_core::report::ClinicalReport;
use cardiregen_core::session::{FrameBlob, Session, SessionStatus};
use tokio::sync::{RwLock, mpsc};

use crate::orchestrator::{AnalysisOrchestrator, StatusUpdate};

/// Holds the session of one workflow and serializes runs on it.
///
/// `AnalysisService` is responsible for:
/// - Endpoint and frame selection changes from the presentation layer
/// - Rejecting a run while another one is in flight
/// - Mirroring each status transition into the shared session
/// - Writing the run's results and metric back as one step
/// - Building reports from the current state
pub struct AnalysisService {
    session: Arc<RwLock<Session>>,
    orchestrator: AnalysisOrchestrator,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the run ends, however it ends. A run
/// dropped before finishing leaves the session `Idle` instead of running.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    session: &'a Arc<RwLock<Session>>,
    finished: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Analysis run cancelled before finishing");
            match self.session.try_write() {
                Ok(mut session) => clear_running(&mut session),
                Err(_) => {
                    if let Ok(handle) = tokio::runtime::Handle::try_current() {
                        let session = Arc::clone(self.session);
                        handle.spawn(async move {
                            clear_running(&mut *session.write().await);
                        });
                    }
                }
            }
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

fn clear_running(session: &mut Session) {
    if session.status.is_running() {
        session.status = SessionStatus::Idle;
    }
}

impl AnalysisService {
    /// Creates a service around an existing session.
    ///
    /// # Arguments
    ///
    /// * `session` - The initial session state
    /// * `orchestrator` - Runs the submissions for this session
    pub fn new(session: Session, orchestrator: AnalysisOrchestrator) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            orchestrator,
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn set_endpoint(&self, endpoint: impl AsRef<str>) {
        self.session.write().await.set_endpoint(endpoint);
    }

    /// Selects the frame for `phase`. Existing results are left alone.
    pub async fn select_frame(&self, phase: Phase, blob: FrameBlob) {
        tracing::debug!(%phase, file = %blob.name, bytes = blob.len(), "Frame selected");
        self.session.write().await.select(phase, blob);
    }

    /// Clears the frame for `phase`. The phase's previous result, and the
    /// ejection fraction derived from it, stay in the session.
    pub async fn clear_frame(&self, phase: Phase) -> Option<FrameBlob> {
        self.session.write().await.clear_selection(phase)
    }

    /// Drops selections, results and the metric.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` if a run is active.
    pub async fn reset(&self) -> Result<()> {
        if self.is_running() {
            return Err(AnalysisError::RunInProgress);
        }
        self.session.write().await.reset();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Copy of the current session state.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.read().await.status.clone()
    }

    pub async fn report(&self) -> ClinicalReport {
        ClinicalReport::from_session(&*self.session.read().await)
    }

    /// Runs the analysis on the current selections.
    ///
    /// Every status transition is mirrored into the shared session as it
    /// happens; results and the metric are written back together when the
    /// run finishes. Dropping the returned future discards the run's results
    /// and returns the session to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `RunInProgress` if another run on this service has not
    /// finished. Every other failure is reported through the returned
    /// session's status.
    pub async fn run(&self) -> Result<Session> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Rejected analysis run: another run is in progress");
            return Err(AnalysisError::RunInProgress);
        }
        let mut guard = InFlightGuard {
            in_flight: &self.in_flight,
            session: &self.session,
            finished: false,
        };

        let working_copy = self.session.read().await.clone();
        let (observer, mut updates) = mpsc::unbounded_channel::<StatusUpdate>();

        let run = async move {
            self.orchestrator
                .run_with_observer(working_copy, &observer)
                .await
            // `observer` drops here and ends the mirror loop below.
        };
        let mirror = async {
            while let Some(update) = updates.recv().await {
                self.session.write().await.status = update.status;
            }
        };
        let (finished, ()) = tokio::join!(run, mirror);

        let mut session = self.session.write().await;
        // Selections and the endpoint may have changed while the run was in
        // flight; keep the newer values.
        let selections = std::mem::take(&mut session.selections);
        let endpoint = session.endpoint().to_string();
        *session = finished.clone();
        session.selections = selections;
        session.set_endpoint(endpoint);
        guard.finished = true;

        Ok(finished)
    }
}
