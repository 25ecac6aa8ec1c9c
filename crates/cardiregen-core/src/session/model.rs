//! Session domain model.
//!
//! A `Session` is the explicit state of one analysis workflow: the endpoint,
//! the frame selected for each phase, the results of successful submissions,
//! the derived ejection fraction and the lifecycle status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::endpoint::normalize_endpoint;
use crate::error::{AnalysisError, FailureReason};
use crate::metric::compute_ejection_fraction;
use crate::phase::Phase;

/// One imaging volume chosen by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBlob {
    /// Source file name, echoed back as `PhaseResult::source_name`.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FrameBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for FrameBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBlob")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validated outcome of one successful frame submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Left-ventricle volume in millilitres.
    pub volume_ml: f64,
    /// Right-ventricle volume in millilitres, when the service reports it.
    #[serde(default)]
    pub rv_volume_ml: Option<f64>,
    /// Raw OBJ payload, when the service produced a mesh.
    #[serde(default)]
    pub mesh_payload: Option<String>,
    pub source_name: String,
}

/// Lifecycle state of a session.
///
/// Transitions for a run that performs work:
/// `Running(ED)`? then `Running(ES)`? then `Succeeded` or `Failed`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running(Phase),
    Failed(FailureReason),
    Succeeded,
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Progress line for display, e.g. `Processing ED...`.
    pub fn describe(&self) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Running(phase) => format!("Processing {phase}..."),
            Self::Failed(reason) => format!("Failed: {}", reason.error.user_message()),
            Self::Succeeded => "Analysis complete".to_string(),
        }
    }
}

/// State of one analysis workflow.
///
/// Results and the metric are private; they only change through
/// [`Session::record_result`] and [`Session::reset`], which keep these
/// invariants:
/// - a phase has a result only if its last successful submission produced it;
///   failed submissions never remove or overwrite a result
/// - `derived_metric` is `Some` iff both results exist and the ED volume is
///   nonzero
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp of the last run or reset (ISO 8601 format)
    pub updated_at: String,
    endpoint: String,
    pub selections: BTreeMap<Phase, FrameBlob>,
    results: BTreeMap<Phase, PhaseResult>,
    derived_metric: Option<f64>,
    metric_error: Option<AnalysisError>,
    pub status: SessionStatus,
}

impl Session {
    pub fn new(endpoint: impl AsRef<str>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
            endpoint: normalize_endpoint(endpoint.as_ref()),
            selections: BTreeMap::new(),
            results: BTreeMap::new(),
            derived_metric: None,
            metric_error: None,
            status: SessionStatus::Idle,
        }
    }

    /// The endpoint with surrounding whitespace and trailing `/` removed.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl AsRef<str>) {
        self.endpoint = normalize_endpoint(endpoint.as_ref());
    }

    /// Selects the frame for `phase`, replacing any previous selection.
    pub fn select(&mut self, phase: Phase, blob: FrameBlob) {
        self.selections.insert(phase, blob);
    }

    /// Clears the selection for `phase` only. Results are kept.
    pub fn clear_selection(&mut self, phase: Phase) -> Option<FrameBlob> {
        self.selections.remove(&phase)
    }

    pub fn selection(&self, phase: Phase) -> Option<&FrameBlob> {
        self.selections.get(&phase)
    }

    pub fn result(&self, phase: Phase) -> Option<&PhaseResult> {
        self.results.get(&phase)
    }

    /// Results of successful submissions, in submission order.
    pub fn results(&self) -> &BTreeMap<Phase, PhaseResult> {
        &self.results
    }

    /// Left-ventricular ejection fraction in percent.
    pub fn derived_metric(&self) -> Option<f64> {
        self.derived_metric
    }

    /// Why `derived_metric` is absent although both results exist.
    pub fn metric_error(&self) -> Option<&AnalysisError> {
        self.metric_error.as_ref()
    }

    /// Stores the result of a successful submission for `phase`, replacing
    /// the previous one, and recomputes the ejection fraction.
    pub fn record_result(&mut self, phase: Phase, result: PhaseResult) {
        self.results.insert(phase, result);
        self.recompute_metric();
    }

    /// Recomputes the metric from scratch when both results exist. With
    /// fewer than two results there is nothing to derive and the metric
    /// stays absent.
    fn recompute_metric(&mut self) {
        let (Some(ed), Some(es)) = (self.result(Phase::Ed), self.result(Phase::Es)) else {
            return;
        };

        match compute_ejection_fraction(ed.volume_ml, es.volume_ml) {
            Ok(percent) => {
                self.derived_metric = Some(percent);
                self.metric_error = None;
            }
            Err(error) => {
                tracing::warn!(session_id = %self.id, kind = error.kind(), %error, "Ejection fraction unavailable");
                self.derived_metric = None;
                self.metric_error = Some(error);
            }
        }
    }

    pub fn has_both_results(&self) -> bool {
        self.results.contains_key(&Phase::Ed) && self.results.contains_key(&Phase::Es)
    }

    /// Phases with a frame selected, in submission order.
    pub fn selected_phases(&self) -> Vec<Phase> {
        self.selections.keys().copied().collect()
    }

    /// Drops selections, results, the metric and the status. The endpoint
    /// and session id are kept.
    pub fn reset(&mut self) {
        self.selections.clear();
        self.results.clear();
        self.derived_metric = None;
        self.metric_error = None;
        self.status = SessionStatus::Idle;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(volume_ml: f64) -> PhaseResult {
        PhaseResult {
            volume_ml,
            rv_volume_ml: None,
            mesh_payload: None,
            source_name: "frame.nii.gz".into(),
        }
    }

    #[test]
    fn test_new_session_is_idle_and_normalized() {
        let session = Session::new("https://host/");
        assert_eq!(session.endpoint(), "https://host");
        assert_eq!(session.status, SessionStatus::Idle);
        assert!(session.selections.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_selections_are_independent() {
        let mut session = Session::default();
        session.select(Phase::Ed, FrameBlob::new("ed.nii.gz", vec![1, 2, 3]));
        session.select(Phase::Es, FrameBlob::new("es.nii.gz", vec![4, 5]));
        session.record_result(Phase::Ed, sample_result(120.0));

        let cleared = session.clear_selection(Phase::Ed).unwrap();

        assert_eq!(cleared.name, "ed.nii.gz");
        assert!(session.selection(Phase::Ed).is_none());
        assert_eq!(session.selection(Phase::Es).unwrap().len(), 2);
        assert!(session.result(Phase::Ed).is_some());
    }

    #[test]
    fn test_selected_phases_in_submission_order() {
        let mut session = Session::default();
        session.select(Phase::Es, FrameBlob::new("es", vec![1]));
        session.select(Phase::Ed, FrameBlob::new("ed", vec![1]));
        assert_eq!(session.selected_phases(), vec![Phase::Ed, Phase::Es]);
    }

    #[test]
    fn test_reset_keeps_endpoint_and_id() {
        let mut session = Session::new("http://localhost:8000");
        let id = session.id.clone();
        session.select(Phase::Ed, FrameBlob::new("ed", vec![1]));
        session.record_result(Phase::Ed, sample_result(100.0));
        session.record_result(Phase::Es, sample_result(40.0));
        assert_eq!(session.derived_metric(), Some(60.0));
        session.status = SessionStatus::Succeeded;

        session.reset();

        assert_eq!(session.id, id);
        assert_eq!(session.endpoint(), "http://localhost:8000");
        assert!(session.results().is_empty());
        assert!(session.selections.is_empty());
        assert_eq!(session.derived_metric(), None);
        assert_eq!(session.status, SessionStatus::Idle);
    }

    #[test]
    fn test_metric_follows_latest_results() {
        let mut session = Session::default();
        session.record_result(Phase::Es, sample_result(45.0));
        assert_eq!(session.derived_metric(), None);
        assert_eq!(session.metric_error(), None);

        session.record_result(Phase::Ed, sample_result(0.0));
        assert_eq!(session.derived_metric(), None);
        assert_eq!(session.metric_error(), Some(&AnalysisError::DivisionByZero));

        session.record_result(Phase::Ed, sample_result(150.0));
        assert_eq!(session.derived_metric(), Some(70.0));
        assert_eq!(session.metric_error(), None);
    }

    #[test]
    fn test_blob_debug_hides_bytes() {
        let blob = FrameBlob::new("ed.nii.gz", vec![0u8; 1024]);
        let rendered = format!("{blob:?}");
        assert!(rendered.contains("len: 1024"));
        assert!(!rendered.contains("[0, 0"));
    }

    #[test]
    fn test_status_describe() {
        assert_eq!(SessionStatus::Running(Phase::Es).describe(), "Processing ES...");
        assert!(!SessionStatus::Succeeded.is_failed());
    }
}
