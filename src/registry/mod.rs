//! Action registry — which mutations exist, how risky they are, and what an
//! operator must type to confirm each one.
//!
//! The registry is a static table built once from the built-in YAML plus any
//! config overrides, then shared (read-only) by the staging queue, the
//! approval workflow and the batch pipeline.

pub mod defaults;
pub mod types;

pub use types::*;

use crate::error::{ChangeError, Result};
use crate::utils::phrase::render_template;
use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeMap;

/// Lookup table from action kind to its registry entry.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    specs: BTreeMap<ActionKind, ActionSpec>,
}

impl ActionRegistry {
    /// The built-in registry with every known action kind.
    pub fn builtin() -> anyhow::Result<Self> {
        let specs: Vec<ActionSpec> = serde_yaml::from_str(defaults::BUILTIN_ACTIONS_YAML)
            .context("Built-in action registry is malformed")?;
        Ok(Self::from_specs(specs))
    }

    /// Build a registry from explicit entries. Later entries for the same
    /// kind replace earlier ones.
    pub fn from_specs(specs: impl IntoIterator<Item = ActionSpec>) -> Self {
        let specs = specs.into_iter().map(|s| (s.kind, s)).collect();
        Self { specs }
    }

    /// Replace built-in entries with the given overrides.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = ActionSpec>) -> Self {
        for spec in overrides {
            self.specs.insert(spec.kind, spec);
        }
        self
    }

    /// Get the registry entry for a kind.
    pub fn spec(&self, kind: ActionKind) -> Option<&ActionSpec> {
        self.specs.get(&kind)
    }

    /// All entries, ordered by kind.
    pub fn specs(&self) -> impl Iterator<Item = &ActionSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Parse a kind string and make sure it has a registry entry.
    pub fn resolve_kind(&self, raw: &str) -> Result<ActionKind> {
        let kind = ActionKind::from_str_loose(raw)
            .ok_or_else(|| ChangeError::UnknownActionType(raw.to_string()))?;
        if !self.specs.contains_key(&kind) {
            return Err(ChangeError::UnknownActionType(raw.to_string()));
        }
        Ok(kind)
    }

    /// Resolve the confirmation phrase, risk and title for an action.
    ///
    /// Template phrases are filled from the payload, so the same kind can
    /// require different phrases (`ENABLE MEILISEARCH` vs `ENABLE TYPESENSE`).
    pub fn requirements(&self, kind: ActionKind, payload: &Value) -> Result<ActionRequirements> {
        let spec = self
            .spec(kind)
            .ok_or_else(|| ChangeError::UnknownActionType(kind.to_string()))?;

        let required_phrase =
            render_template(&spec.phrase, payload).map_err(|field| ChangeError::InvalidPayload {
                kind: kind.to_string(),
                reason: format!("missing field '{}' needed by the confirmation phrase", field),
            })?;

        Ok(ActionRequirements {
            required_phrase,
            risk: spec.risk,
            title: spec.title.clone(),
        })
    }

    /// Advisory text describing how to reverse an applied action by hand.
    pub fn rollback_hint(&self, kind: ActionKind, payload: &Value) -> String {
        match self.spec(kind) {
            Some(spec) => match spec.rollback {
                Some(ref hint) => render_template(hint, payload).unwrap_or_else(|_| hint.clone()),
                None => format!("Manually reverse \"{}\"", spec.title),
            },
            None => format!("Manually reverse {}", kind),
        }
    }
}
