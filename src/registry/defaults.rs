//! Built-in registry and config templates that ship with changegate.
//!
//! - `BUILTIN_ACTIONS_YAML`: the default action table every config starts from
//! - `DEFAULT_CONFIG_YAML`: what `changegate init` writes for a new deployment

/// The built-in action registry.
/// Config files may override entries by kind; they cannot remove them.
pub const BUILTIN_ACTIONS_YAML: &str = r#"
- kind: switch_runtime_primary
  title: Switch runtime to primary profile
  phrase: SWITCH TO V1_PRIMARY
  risk: high
  rollback: Switch the runtime back to its previous profile (SWITCH TO V0_FALLBACK)

- kind: switch_runtime_fallback
  title: Switch runtime to fallback profile
  phrase: SWITCH TO V0_FALLBACK
  risk: high
  rollback: Switch the runtime back to its previous profile (SWITCH TO V1_PRIMARY)

- kind: activate_irt
  title: Activate IRT
  phrase: ACTIVATE IRT
  risk: high
  rollback: Deactivate IRT to return to the previous scoring path

- kind: deactivate_irt
  title: Deactivate IRT
  phrase: DEACTIVATE IRT
  risk: medium
  rollback: Re-activate IRT once calibration is eligible again

- kind: activate_ranking
  title: Put ranking engine in active mode
  phrase: ACTIVATE RANKING
  risk: high
  rollback: Return the ranking engine to shadow mode

- kind: shadow_ranking
  title: Put ranking engine in shadow mode
  phrase: SHADOW RANKING
  risk: medium
  rollback: Re-activate the ranking engine if it was previously active

- kind: enable_search_engine
  title: Enable search engine
  phrase: ENABLE {engine}
  risk: medium
  payload_fields: [engine]
  rollback: Re-enable the previously active search engine

- kind: enable_freeze_updates
  title: Freeze learning-state updates
  phrase: ENABLE FREEZE UPDATES
  risk: high
  rollback: Re-enable updates (DISABLE FREEZE UPDATES)

- kind: disable_freeze_updates
  title: Unfreeze learning-state updates
  phrase: DISABLE FREEZE UPDATES
  risk: medium
  rollback: Freeze updates again (ENABLE FREEZE UPDATES)

- kind: enable_exam_mode
  title: Enable exam mode
  phrase: ENABLE EXAM MODE
  risk: medium
  rollback: Disable exam mode

- kind: disable_exam_mode
  title: Disable exam mode
  phrase: DISABLE EXAM MODE
  risk: low
  rollback: Enable exam mode again

- kind: run_warehouse_export
  title: Run warehouse incremental export
  phrase: RUN WAREHOUSE EXPORT
  risk: low
  rollback: Exports are append-only; mark the exported batch as superseded in the warehouse

- kind: run_graph_sync
  title: Run graph consistency sync
  phrase: RUN GRAPH SYNC
  risk: low
  rollback: Re-run the graph sync from the last known-good snapshot
"#;

/// Default batch-level confirmation literal.
pub const DEFAULT_BATCH_PHRASE: &str = "APPLY CHANGES";

/// Default minimum justification length.
pub const DEFAULT_MIN_REASON_LEN: usize = 10;

/// Starter config written by `changegate init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"# changegate configuration
# Every production mutation goes through here: stage it, justify it, type the phrase.

registry: prod-admin-v1

description: >
  Change control for production admin actions. Runtime switches, IRT and
  ranking activation, update freezes and warehouse exports all need a typed
  confirmation and a written reason.

# Phrase that confirms a whole batch of staged changes
batch_phrase: APPLY CHANGES

# Minimum length of the written justification
min_reason_len: 10

# Give up on a single step after this many seconds (counts as a failure)
step_timeout_secs: 60

# Snapshot of subsystem health read by `changegate status`
status_snapshot: status.json

# Shell commands that perform each action. The payload JSON is passed in
# $CHANGEGATE_PAYLOAD and the action kind in $CHANGEGATE_ACTION.
executors:
  switch_runtime_primary: "echo switching runtime to v1_primary"
  switch_runtime_fallback: "echo switching runtime to v0_fallback"
"#;
