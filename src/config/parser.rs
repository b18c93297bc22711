//! YAML config parser for changegate.
//!
//! # Example config file:
//! ```yaml
//! registry: prod-admin-v1
//! operator: alice
//! batch_phrase: APPLY CHANGES
//! min_reason_len: 10
//! step_timeout_secs: 60
//! actions:
//!   - kind: run_warehouse_export
//!     title: Nightly warehouse export
//!     phrase: RUN WAREHOUSE EXPORT
//!     risk: medium
//! executors:
//!   switch_runtime_primary: "./ops/switch-runtime.sh primary"
//! ```

use crate::config::Config;
use crate::registry::defaults::{DEFAULT_BATCH_PHRASE, DEFAULT_MIN_REASON_LEN};
use crate::registry::{ActionKind, ActionRegistry, ActionSpec, RiskLevel};
use crate::utils::phrase::normalize_phrase;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw YAML representation before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    registry: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    batch_phrase: Option<String>,
    #[serde(default)]
    min_reason_len: Option<usize>,
    #[serde(default)]
    step_timeout_secs: Option<u64>,
    #[serde(default)]
    state_dir: Option<PathBuf>,
    #[serde(default)]
    status_snapshot: Option<PathBuf>,
    #[serde(default)]
    preflight: Option<String>,
    #[serde(default)]
    actions: Vec<RawAction>,
    #[serde(default)]
    executors: HashMap<String, String>,
}

/// A registry entry as written in YAML. Kind and risk are loose strings so
/// aliases work and errors can name the offending entry.
#[derive(Debug, Deserialize)]
struct RawAction {
    kind: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    phrase: Option<String>,
    #[serde(default)]
    risk: Option<String>,
    #[serde(default)]
    payload_fields: Vec<String>,
    #[serde(default)]
    rollback: Option<String>,
}

/// Parse a config file from a path. Relative paths inside it resolve
/// against the file's directory.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config.base_dir = path
        .parent()
        .map(|p| if p.as_os_str().is_empty() { PathBuf::from(".") } else { p.to_path_buf() });
    Ok(config)
}

/// Parse a YAML config string.
pub fn parse_config_str(yaml: &str) -> Result<Config> {
    let raw: RawConfig = serde_yaml::from_str(yaml).context("Invalid YAML syntax in config file")?;

    if raw.registry.trim().is_empty() {
        bail!("Config must have a non-empty 'registry' name");
    }

    let batch_phrase = raw
        .batch_phrase
        .unwrap_or_else(|| DEFAULT_BATCH_PHRASE.to_string());
    if batch_phrase.trim().is_empty() {
        bail!("'batch_phrase' cannot be empty");
    }

    let min_reason_len = raw.min_reason_len.unwrap_or(DEFAULT_MIN_REASON_LEN);
    if min_reason_len == 0 {
        bail!("'min_reason_len' must be at least 1 — every change needs a written reason");
    }

    if raw.step_timeout_secs == Some(0) {
        bail!("'step_timeout_secs' must be greater than 0 (omit it to disable the timeout)");
    }

    let builtin = ActionRegistry::builtin()?;
    let mut actions = Vec::with_capacity(raw.actions.len());
    for (i, raw_action) in raw.actions.into_iter().enumerate() {
        let action = convert_action(raw_action, &builtin)
            .with_context(|| format!("Invalid action at position {} (0-indexed)", i))?;
        actions.push(action);
    }

    let mut executors = BTreeMap::new();
    for (kind_str, command) in raw.executors {
        let kind = ActionKind::from_str_loose(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown action '{}' in executors", kind_str))?;
        if command.trim().is_empty() {
            bail!("Executor command for '{}' is empty", kind);
        }
        executors.insert(kind, command);
    }

    // The batch literal must never double as a single action's phrase
    let registry = builtin.with_overrides(actions.iter().cloned());
    let batch_norm = normalize_phrase(&batch_phrase);
    for spec in registry.specs() {
        if normalize_phrase(&spec.phrase) == batch_norm {
            bail!(
                "'batch_phrase' \"{}\" is also the confirmation phrase for {} — pick a distinct phrase",
                batch_phrase,
                spec.kind
            );
        }
    }

    Ok(Config {
        registry: raw.registry,
        description: raw.description,
        operator: raw.operator.filter(|o| !o.trim().is_empty()),
        batch_phrase,
        min_reason_len,
        step_timeout: raw.step_timeout_secs.map(Duration::from_secs),
        state_dir: raw.state_dir,
        status_snapshot: raw.status_snapshot,
        preflight: raw.preflight.filter(|p| !p.trim().is_empty()),
        actions,
        executors,
        base_dir: None,
    })
}

/// Convert a raw action entry. Omitted fields fall back to the built-in
/// entry for the same kind.
fn convert_action(raw: RawAction, builtin: &ActionRegistry) -> Result<ActionSpec> {
    let kind = ActionKind::from_str_loose(&raw.kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown action kind '{}'", raw.kind))?;
    let base = builtin.spec(kind);

    let phrase = match raw.phrase.or_else(|| base.map(|b| b.phrase.clone())) {
        Some(p) if !p.trim().is_empty() => p,
        _ => bail!("Action '{}' needs a non-empty confirmation phrase", kind),
    };

    let risk = match raw.risk {
        Some(r) => RiskLevel::from_str_loose(&r)
            .ok_or_else(|| anyhow::anyhow!("Unknown risk level '{}' for {}", r, kind))?,
        None => base.map(|b| b.risk).unwrap_or(RiskLevel::High),
    };

    let title = raw
        .title
        .or_else(|| base.map(|b| b.title.clone()))
        .unwrap_or_else(|| kind.to_string());

    let payload_fields = if raw.payload_fields.is_empty() {
        base.map(|b| b.payload_fields.clone()).unwrap_or_default()
    } else {
        raw.payload_fields
    };

    Ok(ActionSpec {
        kind,
        title,
        phrase,
        risk,
        payload_fields,
        rollback: raw.rollback.or_else(|| base.and_then(|b| b.rollback.clone())),
    })
}
