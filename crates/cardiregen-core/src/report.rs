//! Clinical report assembled from a session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mesh::{self, MeshSummary};
use crate::metric::{EjectionFractionCategory, compute_ejection_fraction};
use crate::phase::Phase;
use crate::session::{PhaseResult, Session, SessionStatus};

/// Display state of one phase's mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MeshOutcome {
    Available(MeshSummary),
    /// The service returned no mesh (volume too small or empty mask).
    NotGenerated,
    /// A payload was returned but could not be turned into geometry.
    Unreadable,
}

/// Per-phase section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub source_name: String,
    pub lv_volume_ml: f64,
    pub rv_volume_ml: Option<f64>,
    pub mesh: MeshOutcome,
}

impl PhaseReport {
    fn from_result(phase: Phase, result: &PhaseResult) -> Self {
        let mesh = match result.mesh_payload.as_deref() {
            None => MeshOutcome::NotGenerated,
            Some(payload) => match mesh::normalize(Some(payload)) {
                Some(geometry) => MeshOutcome::Available(geometry.summary()),
                None => MeshOutcome::Unreadable,
            },
        };

        Self {
            phase,
            source_name: result.source_name.clone(),
            lv_volume_ml: result.volume_ml,
            rv_volume_ml: result.rv_volume_ml,
            mesh,
        }
    }
}

/// What the report can say about the ejection fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EfOutcome {
    Value {
        percent: f64,
        category: EjectionFractionCategory,
    },
    /// Both phases are present but the metric could not be computed.
    Unavailable { reason: String },
    /// At least one phase result is missing.
    InsufficientData { missing: Vec<Phase> },
}

/// Report shown to the user after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalReport {
    pub session_id: String,
    pub generated_at: String,
    pub status: SessionStatus,
    pub phases: Vec<PhaseReport>,
    pub ejection_fraction: EfOutcome,
    /// Right-ventricular ejection fraction, when both RV volumes exist.
    pub rv_ejection_fraction: Option<f64>,
}

impl ClinicalReport {
    pub fn from_session(session: &Session) -> Self {
        let phases = session
            .results()
            .iter()
            .map(|(phase, result)| PhaseReport::from_result(*phase, result))
            .collect();

        let ejection_fraction = match (session.derived_metric(), session.metric_error()) {
            (Some(percent), _) => EfOutcome::Value {
                percent,
                category: EjectionFractionCategory::from_percent(percent),
            },
            (None, Some(err)) if session.has_both_results() => EfOutcome::Unavailable {
                reason: err.user_message(),
            },
            _ => EfOutcome::InsufficientData {
                missing: [Phase::Ed, Phase::Es]
                    .into_iter()
                    .filter(|phase| session.result(*phase).is_none())
                    .collect(),
            },
        };

        let rv_ejection_fraction = match (
            session.result(Phase::Ed).and_then(|r| r.rv_volume_ml),
            session.result(Phase::Es).and_then(|r| r.rv_volume_ml),
        ) {
            (Some(ed), Some(es)) => compute_ejection_fraction(ed, es).ok(),
            _ => None,
        };

        Self {
            session_id: session.id.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            status: session.status.clone(),
            phases,
            ejection_fraction,
            rv_ejection_fraction,
        }
    }
}

impl fmt::Display for ClinicalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Clinical Metrics")?;
        writeln!(f, "================")?;

        if self.phases.is_empty() {
            writeln!(f, "No phase results yet.")?;
        }

        for phase in &self.phases {
            writeln!(f)?;
            writeln!(
                f,
                "[{}] {} ({})",
                phase.phase,
                phase.phase.clinical_name(),
                phase.source_name
            )?;
            writeln!(f, "  Left ventricle (LV) volume:  {:.2} ml", phase.lv_volume_ml)?;
            match phase.rv_volume_ml {
                Some(rv) => writeln!(f, "  Right ventricle (RV) volume: {rv:.2} ml")?,
                None => writeln!(f, "  Right ventricle (RV) volume: not reported")?,
            }
            match &phase.mesh {
                MeshOutcome::Available(summary) => writeln!(
                    f,
                    "  3D mesh: {} vertices, {} triangles{}",
                    summary.vertex_count,
                    summary.triangle_count,
                    summary
                        .name
                        .as_deref()
                        .map(|name| format!(" ({name})"))
                        .unwrap_or_default()
                )?,
                MeshOutcome::NotGenerated => writeln!(
                    f,
                    "  3D mesh: not generated (volume too small or empty mask)"
                )?,
                MeshOutcome::Unreadable => writeln!(f, "  3D mesh: payload could not be read")?,
            }
        }

        writeln!(f)?;
        match &self.ejection_fraction {
            EfOutcome::Value { percent, category } => {
                writeln!(f, "LV ejection fraction: {percent:.2}% ({})", category.label())?
            }
            EfOutcome::Unavailable { reason } => writeln!(f, "LV ejection fraction: {reason}")?,
            EfOutcome::InsufficientData { missing } => {
                let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
                writeln!(
                    f,
                    "LV ejection fraction: insufficient data (missing {})",
                    missing.join(", ")
                )?
            }
        }
        if let Some(rv_ef) = self.rv_ejection_fraction {
            writeln!(f, "RV ejection fraction: {rv_ef:.2}%")?;
        }

        write!(f, "Status: {}", self.status.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    const TRIANGLE: &str = "o lv\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn result(volume_ml: f64, rv: Option<f64>, mesh: Option<&str>) -> PhaseResult {
        PhaseResult {
            volume_ml,
            rv_volume_ml: rv,
            mesh_payload: mesh.map(str::to_string),
            source_name: "frame.nii.gz".into(),
        }
    }

    #[test]
    fn test_single_phase_reports_insufficient_data() {
        let mut session = Session::new("http://host");
        session.record_result(Phase::Ed, result(120.0, None, None));

        let report = ClinicalReport::from_session(&session);

        assert_eq!(
            report.ejection_fraction,
            EfOutcome::InsufficientData {
                missing: vec![Phase::Es]
            }
        );
        assert_eq!(report.phases[0].mesh, MeshOutcome::NotGenerated);
        assert!(report.to_string().contains("insufficient data (missing ES)"));
    }

    #[test]
    fn test_full_report_with_metric_and_mesh() {
        let mut session = Session::new("http://host");
        session.record_result(Phase::Ed, result(120.0, Some(150.0), Some(TRIANGLE)));
        session.record_result(Phase::Es, result(45.0, Some(75.0), Some("v 1\n")));
        session.status = SessionStatus::Succeeded;

        let report = ClinicalReport::from_session(&session);

        match &report.phases[0].mesh {
            MeshOutcome::Available(summary) => assert_eq!(summary.triangle_count, 1),
            other => panic!("unexpected mesh outcome: {other:?}"),
        }
        assert_eq!(report.phases[1].mesh, MeshOutcome::Unreadable);
        assert_eq!(
            report.ejection_fraction,
            EfOutcome::Value {
                percent: 62.5,
                category: EjectionFractionCategory::Normal
            }
        );
        assert_eq!(report.rv_ejection_fraction, Some(50.0));

        let text = report.to_string();
        assert!(text.contains("LV ejection fraction: 62.50% (normal)"));
        assert!(text.contains("Status: Analysis complete"));
    }

    #[test]
    fn test_zero_ed_volume_reports_unavailable() {
        let mut session = Session::new("http://host");
        session.record_result(Phase::Ed, result(0.0, None, None));
        session.record_result(Phase::Es, result(45.0, None, None));
        assert_eq!(session.metric_error(), Some(&AnalysisError::DivisionByZero));

        let report = ClinicalReport::from_session(&session);

        assert!(matches!(report.ejection_fraction, EfOutcome::Unavailable { .. }));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let session = Session::new("http://host");
        let report = ClinicalReport::from_session(&session);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["ejection_fraction"]["type"], "insufficient_data");
        assert_eq!(json["status"]["type"], "Idle");
    }
}
