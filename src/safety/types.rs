//! Inputs and outputs of the safety evaluator.
//!
//! Each input is a point-in-time read from one subsystem. Field names match
//! the JSON those subsystems report so a snapshot file deserializes directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which runtime profile is serving production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeProfile {
    V1Primary,
    #[default]
    V0Fallback,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeMode {
    /// All learning-state writes are frozen
    #[serde(default)]
    pub freeze_updates: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub profile: RuntimeProfile,
    #[serde(default)]
    pub safe_mode: SafeMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrtStatus {
    /// IRT scoring is serving production
    #[serde(default)]
    pub active: bool,
    /// Calibration is complete enough that IRT could be activated
    #[serde(default)]
    pub eligible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    #[default]
    Off,
    Shadow,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankStatus {
    #[serde(default)]
    pub mode: RankingMode,
    #[serde(default)]
    pub eligible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphHealth {
    /// The graph/consistency backend answers and is in sync
    #[serde(default)]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything the evaluator looks at. There are no hidden reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyInputs {
    #[serde(default)]
    pub runtime_config: RuntimeConfig,
    #[serde(default)]
    pub irt_status: IrtStatus,
    #[serde(default)]
    pub rank_status: RankStatus,
    #[serde(default)]
    pub graph_health: GraphHealth,
}

/// Coarse safety verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Safe,
    Caution,
    Unsafe,
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyStatus::Safe => write!(f, "safe"),
            SafetyStatus::Caution => write!(f, "caution"),
            SafetyStatus::Unsafe => write!(f, "unsafe"),
        }
    }
}

/// Verdict plus the signals that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    pub status: SafetyStatus,
    pub reasons: Vec<String>,
}
