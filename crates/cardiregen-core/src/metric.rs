//! Ejection-fraction computation.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Computes the ejection fraction, in percent, from end-diastole and
/// end-systole volumes.
///
/// `((ed - es) / ed) * 100`, rounded to two decimal places.
///
/// The result is not clamped: an ES volume larger than the ED volume gives a
/// negative value, which the report shows as-is.
///
/// # Errors
///
/// - `DivisionByZero` if `ed_volume_ml` is zero.
/// - `Validation` if either volume is NaN or infinite.
///
/// # Examples
///
/// ```
/// use cardiregen_core::metric::compute_ejection_fraction;
///
/// assert_eq!(compute_ejection_fraction(120.0, 45.0).unwrap(), 62.5);
/// ```
pub fn compute_ejection_fraction(ed_volume_ml: f64, es_volume_ml: f64) -> Result<f64> {
    if !ed_volume_ml.is_finite() || !es_volume_ml.is_finite() {
        return Err(AnalysisError::validation(format!(
            "Volumes must be finite numbers (ED={ed_volume_ml}, ES={es_volume_ml})"
        )));
    }
    if ed_volume_ml == 0.0 {
        return Err(AnalysisError::DivisionByZero);
    }

    let fraction = (ed_volume_ml - es_volume_ml) / ed_volume_ml * 100.0;
    Ok(round_to_hundredths(fraction))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Coarse clinical banding of a left-ventricular ejection fraction.
///
/// Used only to annotate reports; it never alters the computed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EjectionFractionCategory {
    /// Below zero or above one hundred percent: the input volumes are suspect.
    Implausible,
    /// 40% or less.
    Reduced,
    /// Between 41% and 49%.
    MildlyReduced,
    /// Between 50% and 70%.
    Normal,
    /// Above 70%.
    Hyperdynamic,
}

impl EjectionFractionCategory {
    pub fn from_percent(percent: f64) -> Self {
        match percent {
            p if !(0.0..=100.0).contains(&p) => Self::Implausible,
            p if p <= 40.0 => Self::Reduced,
            p if p < 50.0 => Self::MildlyReduced,
            p if p <= 70.0 => Self::Normal,
            _ => Self::Hyperdynamic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Implausible => "outside physiological range",
            Self::Reduced => "reduced",
            Self::MildlyReduced => "mildly reduced",
            Self::Normal => "normal",
            Self::Hyperdynamic => "hyperdynamic",
        }
    }
}
