//! Core types for the action registry.
//!
//! An `ActionKind` names a production mutation; an `ActionSpec` says how
//! dangerous it is and what an operator has to type to confirm it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every administrative mutation the engine knows how to stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Switch the scoring/ranking runtime to the primary profile
    SwitchRuntimePrimary,
    /// Switch the runtime back to the fallback profile
    SwitchRuntimeFallback,
    ActivateIrt,
    DeactivateIrt,
    /// Put the ranking engine into active mode
    ActivateRanking,
    /// Run the ranking engine in shadow mode (computed, not served)
    ShadowRanking,
    /// Enable a search engine; payload carries `engine`
    EnableSearchEngine,
    /// Freeze all learning-state writes
    EnableFreezeUpdates,
    DisableFreezeUpdates,
    EnableExamMode,
    DisableExamMode,
    /// Trigger an incremental warehouse export
    RunWarehouseExport,
    /// Trigger a graph/consistency sync
    RunGraphSync,
}

impl ActionKind {
    pub const ALL: [ActionKind; 13] = [
        ActionKind::SwitchRuntimePrimary,
        ActionKind::SwitchRuntimeFallback,
        ActionKind::ActivateIrt,
        ActionKind::DeactivateIrt,
        ActionKind::ActivateRanking,
        ActionKind::ShadowRanking,
        ActionKind::EnableSearchEngine,
        ActionKind::EnableFreezeUpdates,
        ActionKind::DisableFreezeUpdates,
        ActionKind::EnableExamMode,
        ActionKind::DisableExamMode,
        ActionKind::RunWarehouseExport,
        ActionKind::RunGraphSync,
    ];

    /// The snake_case key used in config files, the CLI and the audit log.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SwitchRuntimePrimary => "switch_runtime_primary",
            ActionKind::SwitchRuntimeFallback => "switch_runtime_fallback",
            ActionKind::ActivateIrt => "activate_irt",
            ActionKind::DeactivateIrt => "deactivate_irt",
            ActionKind::ActivateRanking => "activate_ranking",
            ActionKind::ShadowRanking => "shadow_ranking",
            ActionKind::EnableSearchEngine => "enable_search_engine",
            ActionKind::EnableFreezeUpdates => "enable_freeze_updates",
            ActionKind::DisableFreezeUpdates => "disable_freeze_updates",
            ActionKind::EnableExamMode => "enable_exam_mode",
            ActionKind::DisableExamMode => "disable_exam_mode",
            ActionKind::RunWarehouseExport => "run_warehouse_export",
            ActionKind::RunGraphSync => "run_graph_sync",
        }
    }

    /// Parse a kind from a string. Accepts a few aliases so operators don't
    /// have to remember the exact key.
    pub fn from_str_loose(s: &str) -> Option<ActionKind> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "switch_runtime_primary" | "runtime_primary" | "v1_primary" => {
                Some(ActionKind::SwitchRuntimePrimary)
            }
            "switch_runtime_fallback" | "runtime_fallback" | "v0_fallback" => {
                Some(ActionKind::SwitchRuntimeFallback)
            }
            "activate_irt" => Some(ActionKind::ActivateIrt),
            "deactivate_irt" => Some(ActionKind::DeactivateIrt),
            "activate_ranking" => Some(ActionKind::ActivateRanking),
            "shadow_ranking" => Some(ActionKind::ShadowRanking),
            "enable_search_engine" | "enable_search" => Some(ActionKind::EnableSearchEngine),
            "enable_freeze_updates" | "freeze" | "freeze_updates" => {
                Some(ActionKind::EnableFreezeUpdates)
            }
            "disable_freeze_updates" | "unfreeze" | "unfreeze_updates" => {
                Some(ActionKind::DisableFreezeUpdates)
            }
            "enable_exam_mode" => Some(ActionKind::EnableExamMode),
            "disable_exam_mode" => Some(ActionKind::DisableExamMode),
            "run_warehouse_export" | "warehouse_export" => Some(ActionKind::RunWarehouseExport),
            "run_graph_sync" | "graph_sync" => Some(ActionKind::RunGraphSync),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_str_loose(s: &str) -> Option<RiskLevel> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" | "med" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub kind: ActionKind,

    /// Human-readable title shown in the staged list and approval prompts
    pub title: String,

    /// Confirmation phrase, possibly a template with `{field}` placeholders
    /// filled from the payload (e.g. `ENABLE {engine}`)
    pub phrase: String,

    pub risk: RiskLevel,

    /// Payload fields this action expects (informational; executors validate)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload_fields: Vec<String>,

    /// Advisory text describing how to reverse the action by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback: Option<String>,
}

/// What `ActionRegistry::requirements` resolves for one kind + payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequirements {
    pub required_phrase: String,
    pub risk: RiskLevel,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_key() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_str_loose(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(
            ActionKind::from_str_loose("Freeze"),
            Some(ActionKind::EnableFreezeUpdates)
        );
        assert_eq!(
            ActionKind::from_str_loose("switch-runtime-primary"),
            Some(ActionKind::SwitchRuntimePrimary)
        );
        assert_eq!(ActionKind::from_str_loose("drop_database"), None);
    }

    #[test]
    fn test_risk_ordering() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }
}
