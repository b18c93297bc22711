//! Config linter — flags registries that are valid but easy to misuse.
//!
//! `changegate check` runs this after parsing. It looks for:
//! - Two kinds sharing one confirmation phrase
//! - High-risk actions with phrases short enough to type on autopilot
//! - High-risk actions with no rollback hint
//! - Kinds with no executor configured (they can be staged but will fail)

use crate::config::Config;
use crate::registry::{ActionRegistry, RiskLevel};
use crate::utils::phrase::normalize_phrase;
use colored::Colorize;
use std::collections::HashMap;

/// Phrases shorter than this are flagged on high-risk actions.
const MIN_HIGH_RISK_PHRASE_LEN: usize = 8;

/// Something the operator should know about their config.
#[derive(Debug)]
pub struct LintWarning {
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

impl LintWarning {
    fn warn_with_fix(msg: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: Some(fix.into()),
        }
    }

    fn info(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: msg.into(),
            suggestion: None,
        }
    }

    /// Format for terminal output.
    pub fn display(&self) -> String {
        let icon = match self.severity {
            Severity::Warning => "⚠".yellow().to_string(),
            Severity::Info => "ℹ".blue().to_string(),
        };
        let mut out = format!("  {} {}", icon, self.message);
        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!("\n    {}: {}", "Fix".green(), suggestion));
        }
        out
    }
}

/// Lint a config against its resolved registry.
pub fn lint_config(config: &Config, registry: &ActionRegistry) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    check_duplicate_phrases(registry, &mut warnings);
    check_short_high_risk_phrases(registry, &mut warnings);
    check_rollback_hints(registry, &mut warnings);
    check_executor_coverage(config, registry, &mut warnings);

    warnings
}

fn check_duplicate_phrases(registry: &ActionRegistry, warnings: &mut Vec<LintWarning>) {
    let mut seen: HashMap<String, Vec<String>> = HashMap::new();
    for spec in registry.specs() {
        seen.entry(normalize_phrase(&spec.phrase))
            .or_default()
            .push(spec.kind.to_string());
    }

    let mut dupes: Vec<_> = seen.into_iter().filter(|(_, kinds)| kinds.len() > 1).collect();
    dupes.sort();
    for (phrase, kinds) in dupes {
        warnings.push(LintWarning::warn_with_fix(
            format!("Phrase \"{}\" confirms more than one action: {}", phrase, kinds.join(", ")),
            "Give each action its own phrase so a confirmation can't be reused",
        ));
    }
}

fn check_short_high_risk_phrases(registry: &ActionRegistry, warnings: &mut Vec<LintWarning>) {
    for spec in registry.specs() {
        if spec.risk == RiskLevel::High && spec.phrase.trim().len() < MIN_HIGH_RISK_PHRASE_LEN {
            warnings.push(LintWarning::warn_with_fix(
                format!(
                    "High-risk action {} has a very short phrase (\"{}\")",
                    spec.kind, spec.phrase
                ),
                "Use a phrase that names what changes, e.g. \"SWITCH TO V1_PRIMARY\"",
            ));
        }
    }
}

fn check_rollback_hints(registry: &ActionRegistry, warnings: &mut Vec<LintWarning>) {
    for spec in registry.specs() {
        if spec.risk == RiskLevel::High && spec.rollback.is_none() {
            warnings.push(LintWarning::warn_with_fix(
                format!("High-risk action {} has no rollback hint", spec.kind),
                format!("Add: rollback: \"How to reverse {}\"", spec.title),
            ));
        }
    }
}

fn check_executor_coverage(
    config: &Config,
    registry: &ActionRegistry,
    warnings: &mut Vec<LintWarning>,
) {
    let missing: Vec<String> = registry
        .specs()
        .filter(|spec| !config.executors.contains_key(&spec.kind))
        .map(|spec| spec.kind.to_string())
        .collect();

    if !missing.is_empty() {
        warnings.push(LintWarning::info(format!(
            "No executor configured for {} action(s): {} — these will fail unless run with --dry-run",
            missing.len(),
            missing.join(", ")
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_config_str;
    use crate::registry::{ActionKind, ActionSpec};

    fn lint(yaml: &str) -> Vec<LintWarning> {
        let config = parse_config_str(yaml).unwrap();
        let registry = config.action_registry().unwrap();
        lint_config(&config, &registry)
    }

    #[test]
    fn test_builtin_registry_only_reports_executors() {
        let warnings = lint("registry: test\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Info);
    }

    #[test]
    fn test_duplicate_phrase() {
        let warnings = lint(
            r#"
registry: test
actions:
  - kind: deactivate_irt
    phrase: activate irt
"#,
        );
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("confirms more than one action")));
    }

    #[test]
    fn test_short_high_risk_phrase() {
        let warnings = lint(
            r#"
registry: test
actions:
  - kind: activate_ranking
    phrase: GO
"#,
        );
        assert!(warnings.iter().any(|w| w.message.contains("very short phrase")));
    }

    #[test]
    fn test_override_inherits_rollback_hint() {
        let warnings = lint(
            r#"
registry: test
actions:
  - kind: run_graph_sync
    risk: high
"#,
        );
        assert!(!warnings.iter().any(|w| w.message.contains("no rollback hint")));
    }

    #[test]
    fn test_high_risk_without_rollback() {
        let registry = ActionRegistry::from_specs(vec![ActionSpec {
            kind: ActionKind::ActivateIrt,
            title: "Activate IRT".to_string(),
            phrase: "ACTIVATE IRT".to_string(),
            risk: RiskLevel::High,
            payload_fields: vec![],
            rollback: None,
        }]);
        let warnings = lint_config(&Config::default(), &registry);
        assert!(warnings.iter().any(|w| w.message.contains("no rollback hint")));
    }
}
