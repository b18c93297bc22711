//! Safety verdict — a pure rule cascade over subsystem status reads.
//!
//! Tiers are checked in order and the first one that matches wins:
//!
//! 1. `unsafe`:  updates are frozen (dominates everything else)
//! 2. `unsafe`:  IRT or active ranking is serving while the graph backend
//!                is unavailable
//! 3. `caution`: some subsystem is not eligible/ready, even if inactive
//! 4. `safe`:    otherwise
//!
//! Nothing here reads or writes anything; call it again whenever an input
//! refreshes.

use crate::safety::types::*;

/// Evaluate the safety verdict for one set of status reads.
pub fn evaluate(inputs: &SafetyInputs) -> SafetyAssessment {
    if inputs.runtime_config.safe_mode.freeze_updates {
        return SafetyAssessment {
            status: SafetyStatus::Unsafe,
            reasons: vec!["Learning-state updates are frozen".to_string()],
        };
    }

    let active = active_subsystems(inputs);
    if !active.is_empty() && !inputs.graph_health.available {
        let reasons = active
            .iter()
            .map(|name| format!("{} is active but the graph backend is unavailable", name))
            .collect();
        return SafetyAssessment {
            status: SafetyStatus::Unsafe,
            reasons,
        };
    }

    let not_ready = not_ready_subsystems(inputs);
    if !not_ready.is_empty() {
        return SafetyAssessment {
            status: SafetyStatus::Caution,
            reasons: not_ready,
        };
    }

    SafetyAssessment {
        status: SafetyStatus::Safe,
        reasons: Vec::new(),
    }
}

/// Critical subsystems currently serving production.
fn active_subsystems(inputs: &SafetyInputs) -> Vec<&'static str> {
    let mut active = Vec::new();
    if inputs.irt_status.active {
        active.push("IRT");
    }
    if inputs.rank_status.mode == RankingMode::Active {
        active.push("Ranking engine");
    }
    active
}

fn not_ready_subsystems(inputs: &SafetyInputs) -> Vec<String> {
    let mut reasons = Vec::new();

    if !inputs.irt_status.eligible {
        reasons.push(if inputs.irt_status.active {
            "IRT is active but not eligible".to_string()
        } else {
            "IRT is not eligible for activation".to_string()
        });
    }
    if !inputs.rank_status.eligible {
        reasons.push(match inputs.rank_status.mode {
            RankingMode::Active => "Ranking engine is active but not eligible".to_string(),
            mode => format!(
                "Ranking engine is not eligible for activation (mode: {})",
                match mode {
                    RankingMode::Shadow => "shadow",
                    _ => "off",
                }
            ),
        });
    }
    if !inputs.graph_health.available {
        let mut reason = "Graph backend is unavailable".to_string();
        if let Some(ref detail) = inputs.graph_health.detail {
            reason.push_str(&format!(" ({})", detail));
        }
        reasons.push(reason);
    }

    reasons
}
