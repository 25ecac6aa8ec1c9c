//! Cardiac phases a frame can be captured at.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The two cardiac phases the workflow knows about.
///
/// The declaration order is the submission order: ED is always processed
/// before ES.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Phase {
    /// End-diastole: maximum chamber volume, the EF baseline.
    #[serde(rename = "ED")]
    #[strum(to_string = "ED", serialize = "ed")]
    Ed,
    /// End-systole: minimum chamber volume after contraction.
    #[serde(rename = "ES")]
    #[strum(to_string = "ES", serialize = "es")]
    Es,
}

impl Phase {
    /// Long clinical name of the phase.
    pub fn clinical_name(&self) -> &'static str {
        match self {
            Phase::Ed => "End-Diastole",
            Phase::Es => "End-Systole",
        }
    }
}
