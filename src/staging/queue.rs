//! The staged action queue.
//!
//! An owned, ordered store of proposed actions. Insertion order is execution
//! order. The only ways to change it are `stage`, `remove`, `clear` and the
//! pipeline's `retain_ids` after a run. Staging never executes anything.
//!
//! The queue is persisted as JSON between CLI invocations so an operator can
//! stage in one command and apply in another.

use crate::error::{ChangeError, Result};
use crate::registry::{ActionKind, ActionRegistry};
use crate::staging::types::StagedAction;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Ordered collection of staged actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagedQueue {
    actions: Vec<StagedAction>,
}

impl StagedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new action at the tail of the queue.
    ///
    /// Fails with `UnknownActionType` when the kind has no registry entry,
    /// and with `InvalidPayload` when the payload can't satisfy the
    /// registry's confirmation phrase template.
    pub fn stage(
        &mut self,
        registry: &ActionRegistry,
        kind: ActionKind,
        payload: Value,
        diff_summary: impl Into<String>,
    ) -> Result<StagedAction> {
        let requirements = registry.requirements(kind, &payload)?;

        let action = StagedAction {
            id: self.fresh_id(),
            kind,
            payload,
            risk: requirements.risk,
            diff_summary: diff_summary.into(),
            created_at: Utc::now(),
        };

        tracing::info!("Staged {}", action.describe());
        self.actions.push(action.clone());
        Ok(action)
    }

    /// Remove one action by id. Remaining entries keep their order.
    /// Accepts the full id or an unambiguous prefix.
    pub fn remove(&mut self, id: &str) -> Result<StagedAction> {
        let index = self
            .position(id)
            .ok_or_else(|| ChangeError::UnknownStagedAction(id.to_string()))?;
        let removed = self.actions.remove(index);
        tracing::info!("Removed staged action {}", removed.describe());
        Ok(removed)
    }

    /// Drop every staged action.
    pub fn clear(&mut self) -> usize {
        let count = self.actions.len();
        self.actions.clear();
        tracing::info!("Cleared {} staged action(s)", count);
        count
    }

    pub fn has_changes(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn list(&self) -> &[StagedAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StagedAction> {
        self.position(id).map(|i| &self.actions[i])
    }

    /// Keep only the actions whose ids are in `keep`, in their current order.
    /// Used by the pipeline to drop successfully applied actions.
    pub(crate) fn retain_ids(&mut self, keep: &HashSet<String>) {
        self.actions.retain(|a| keep.contains(&a.id));
    }

    /// Load a queue from disk. A missing file is an empty queue.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read staged queue: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse staged queue: {}", path.display()))
    }

    /// Write the queue to disk, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize staged queue")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write staged queue: {}", path.display()))
    }

    fn position(&self, id: &str) -> Option<usize> {
        if let Some(i) = self.actions.iter().position(|a| a.id == id) {
            return Some(i);
        }
        // Short-id prefix, only if unambiguous
        if id.len() < 4 {
            return None;
        }
        let mut matches = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.actions.iter().any(|a| a.id == id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RiskLevel;
    use serde_json::json;
    use tempfile::TempDir;

    fn registry() -> ActionRegistry {
        ActionRegistry::builtin().unwrap()
    }

    fn staged_queue(kinds: &[ActionKind]) -> StagedQueue {
        let registry = registry();
        let mut queue = StagedQueue::new();
        for kind in kinds {
            queue
                .stage(&registry, *kind, Value::Null, format!("stage {}", kind))
                .unwrap();
        }
        queue
    }

    #[test]
    fn test_stage_appends_in_order() {
        let queue = staged_queue(&[
            ActionKind::ActivateIrt,
            ActionKind::RunGraphSync,
            ActionKind::EnableExamMode,
        ]);
        let kinds: Vec<_> = queue.list().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::ActivateIrt,
                ActionKind::RunGraphSync,
                ActionKind::EnableExamMode
            ]
        );
        assert!(queue.has_changes());
        assert_eq!(queue.list()[0].risk, RiskLevel::High);
    }

    #[test]
    fn test_ids_are_unique() {
        let queue = staged_queue(&[ActionKind::RunGraphSync; 20]);
        let ids: HashSet<_> = queue.list().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_stage_requires_template_fields() {
        let mut queue = StagedQueue::new();
        let err = queue
            .stage(&registry(), ActionKind::EnableSearchEngine, json!({}), "search")
            .unwrap_err();
        assert!(matches!(err, ChangeError::InvalidPayload { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut queue = staged_queue(&[
            ActionKind::ActivateIrt,
            ActionKind::RunGraphSync,
            ActionKind::EnableExamMode,
            ActionKind::RunWarehouseExport,
        ]);
        let middle = queue.list()[1].id.clone();
        queue.remove(&middle).unwrap();

        let kinds: Vec<_> = queue.list().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::ActivateIrt,
                ActionKind::EnableExamMode,
                ActionKind::RunWarehouseExport
            ]
        );
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut queue = staged_queue(&[ActionKind::ActivateIrt]);
        assert!(matches!(
            queue.remove("not-an-id"),
            Err(ChangeError::UnknownStagedAction(_))
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_remove_by_short_id() {
        let mut queue = staged_queue(&[ActionKind::ActivateIrt, ActionKind::RunGraphSync]);
        let short = queue.list()[0].short_id().to_string();
        let removed = queue.remove(&short).unwrap();
        assert_eq!(removed.kind, ActionKind::ActivateIrt);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut queue = staged_queue(&[ActionKind::ActivateIrt, ActionKind::RunGraphSync]);
        assert_eq!(queue.clear(), 2);
        assert!(!queue.has_changes());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/queue.json");

        let queue = staged_queue(&[ActionKind::ActivateIrt, ActionKind::RunGraphSync]);
        queue.save(&path).unwrap();

        let loaded = StagedQueue::load(&path).unwrap();
        assert_eq!(loaded.list(), queue.list());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let loaded = StagedQueue::load(tmp.path().join("nope.json")).unwrap();
        assert!(loaded.is_empty());
    }
}
