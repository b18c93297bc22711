//! Batch apply behavior: ordering, abort-on-failure, rollback suggestions,
//! and what stays staged afterwards.

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use changegate::executor::{ActionExecutor, BackendProbe, ExecutorSet};
use changegate::pipeline::{BatchPipeline, BatchRequest, StepStatus};
use changegate::registry::{ActionKind, ActionRegistry, RiskLevel};
use changegate::staging::StagedQueue;
use changegate::ChangeError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const REASON: &str = "weekly calibration rollout";

/// Records every call; fails for the kinds it is told to.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<ActionKind>>,
    fail_on: Vec<ActionKind>,
}

impl Recorder {
    fn failing(kinds: &[ActionKind]) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_on: kinds.to_vec(),
        })
    }

    fn calls(&self) -> Vec<ActionKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for Recorder {
    async fn execute(&self, kind: ActionKind, _payload: &Value) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(kind);
        if self.fail_on.contains(&kind) {
            bail!("backend returned 500 for {}", kind);
        }
        Ok(format!("{} done", kind))
    }
}

struct DownProbe;

#[async_trait]
impl BackendProbe for DownProbe {
    async fn check(&self) -> anyhow::Result<()> {
        Err(anyhow!("connection refused"))
    }
}

fn registry() -> Arc<ActionRegistry> {
    Arc::new(ActionRegistry::builtin().unwrap())
}

fn pipeline(recorder: Arc<Recorder>) -> BatchPipeline {
    BatchPipeline::new(
        registry(),
        Arc::new(ExecutorSet::new().with_fallback(recorder)),
    )
}

/// A (high), B (low), C (medium), in that order.
fn abc_queue() -> StagedQueue {
    let registry = registry();
    let mut queue = StagedQueue::new();
    queue
        .stage(&registry, ActionKind::ActivateIrt, Value::Null, "A")
        .unwrap();
    queue
        .stage(&registry, ActionKind::RunWarehouseExport, Value::Null, "B")
        .unwrap();
    queue
        .stage(
            &registry,
            ActionKind::EnableSearchEngine,
            json!({"engine": "bm25"}),
            "C",
        )
        .unwrap();
    queue
}

#[tokio::test]
async fn test_failure_skips_the_rest() {
    let mut queue = abc_queue();
    let ids: Vec<String> = queue.list().iter().map(|a| a.id.clone()).collect();
    assert_eq!(queue.list()[0].risk, RiskLevel::High);
    assert_eq!(queue.list()[1].risk, RiskLevel::Low);
    assert_eq!(queue.list()[2].risk, RiskLevel::Medium);

    let recorder = Recorder::failing(&[ActionKind::RunWarehouseExport]);
    let mut seen = Vec::new();
    let result = pipeline(recorder.clone())
        .apply(
            &mut queue,
            &BatchRequest::new(REASON, "APPLY CHANGES"),
            |p| seen.push((p.action_id.clone(), p.status)),
        )
        .await
        .unwrap();

    assert_eq!(result.succeeded.len(), 1);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.succeeded[0].id, ids[0]);
    assert_eq!(result.failed[0].id, ids[1]);
    assert_eq!(result.skipped[0].id, ids[2]);

    // C's executor is never invoked
    assert_eq!(
        recorder.calls(),
        vec![ActionKind::ActivateIrt, ActionKind::RunWarehouseExport]
    );

    assert_eq!(result.rollback_suggestions.len(), 1);
    assert_eq!(result.rollback_suggestions[0].action_id, ids[0]);
    assert_eq!(result.rollback_suggestions[0].kind, ActionKind::ActivateIrt);

    assert!(result.error_for(&ids[1]).unwrap().contains("500"));

    // running before each executed step, terminal entries in queue order
    assert_eq!(
        seen,
        vec![
            (ids[0].clone(), StepStatus::Running),
            (ids[0].clone(), StepStatus::Success),
            (ids[1].clone(), StepStatus::Running),
            (ids[1].clone(), StepStatus::Failed),
            (ids[2].clone(), StepStatus::Skipped),
        ]
    );

    // B and C stay staged, in order
    let remaining: Vec<&str> = queue.list().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(remaining, vec![ids[1].as_str(), ids[2].as_str()]);
}

#[tokio::test]
async fn test_full_success_empties_queue() {
    let mut queue = abc_queue();
    let recorder = Recorder::failing(&[]);
    let result = pipeline(recorder.clone())
        .apply(&mut queue, &BatchRequest::new(REASON, "apply changes"), |_| {})
        .await
        .unwrap();

    assert!(result.is_full_success());
    assert_eq!(result.total(), 3);
    assert_eq!(result.rollback_suggestions.len(), 3);
    assert_eq!(recorder.calls().len(), 3);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_best_effort_policy_runs_everything() {
    let mut queue = abc_queue();
    let recorder = Recorder::failing(&[ActionKind::ActivateIrt]);
    let result = pipeline(recorder.clone())
        .with_skip_on_failure(false)
        .apply(&mut queue, &BatchRequest::new(REASON, "APPLY CHANGES"), |_| {})
        .await
        .unwrap();

    assert_eq!(recorder.calls().len(), 3);
    assert_eq!(result.succeeded.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert!(result.skipped.is_empty());
    assert_eq!(result.total(), 3);
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn test_short_reason_rejected_before_any_call() {
    let mut queue = abc_queue();
    let recorder = Recorder::failing(&[]);
    let mut progress_calls = 0;
    let err = pipeline(recorder.clone())
        .apply(
            &mut queue,
            &BatchRequest::new("too short", "APPLY CHANGES"),
            |_| progress_calls += 1,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChangeError::ReasonTooShort { min: 10, actual: 9 }));
    assert!(err.is_local_validation());
    assert!(recorder.calls().is_empty());
    assert_eq!(progress_calls, 0);
    assert_eq!(queue.len(), 3);
}

#[tokio::test]
async fn test_wrong_phrase_rejected_before_any_call() {
    let mut queue = abc_queue();
    let recorder = Recorder::failing(&[]);
    let err = pipeline(recorder.clone())
        .apply(&mut queue, &BatchRequest::new(REASON, "APPLY CHANGE"), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ChangeError::PhraseMismatch { .. }));
    assert!(recorder.calls().is_empty());
    assert_eq!(queue.len(), 3);
}

#[tokio::test]
async fn test_empty_queue_rejected() {
    let mut queue = StagedQueue::new();
    let err = pipeline(Recorder::failing(&[]))
        .apply(&mut queue, &BatchRequest::new(REASON, "APPLY CHANGES"), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ChangeError::EmptyQueue));
}

#[tokio::test]
async fn test_preflight_failure_touches_nothing() {
    let mut queue = abc_queue();
    let recorder = Recorder::failing(&[]);
    let executors = ExecutorSet::new()
        .with_fallback(recorder.clone())
        .with_probe(Arc::new(DownProbe));
    let mut progress_calls = 0;

    let err = BatchPipeline::new(registry(), Arc::new(executors))
        .apply(
            &mut queue,
            &BatchRequest::new(REASON, "APPLY CHANGES"),
            |_| progress_calls += 1,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChangeError::BackendUnavailable(_)));
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(progress_calls, 0);
    assert!(recorder.calls().is_empty());
    assert_eq!(queue.len(), 3);
}

#[tokio::test]
async fn test_custom_batch_phrase() {
    let mut queue = abc_queue();
    let pipeline = pipeline(Recorder::failing(&[])).with_batch_phrase("SHIP IT NOW");

    let err = pipeline
        .apply(&mut queue, &BatchRequest::new(REASON, "APPLY CHANGES"), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ChangeError::PhraseMismatch { ref expected } if expected == "SHIP IT NOW"));

    let result = pipeline
        .apply(&mut queue, &BatchRequest::new(REASON, " ship it now "), |_| {})
        .await
        .unwrap();
    assert!(result.is_full_success());
}
