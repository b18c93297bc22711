//! Safety verdicts read through a status source, as `changegate status` does.

use changegate::safety::{
    collect_inputs, evaluate, GraphHealth, IrtStatus, RankStatus, RankingMode, RuntimeConfig,
    RuntimeProfile, SafeMode, SafetyInputs, SafetyStatus, SnapshotFileSource, StaticSource,
};
use tempfile::TempDir;

fn all_green() -> SafetyInputs {
    SafetyInputs {
        runtime_config: RuntimeConfig {
            profile: RuntimeProfile::V1Primary,
            safe_mode: SafeMode::default(),
        },
        irt_status: IrtStatus {
            active: true,
            eligible: true,
        },
        rank_status: RankStatus {
            mode: RankingMode::Active,
            eligible: true,
        },
        graph_health: GraphHealth {
            available: true,
            detail: None,
        },
    }
}

#[tokio::test]
async fn test_freeze_dominates_healthy_system() {
    let mut inputs = all_green();
    inputs.runtime_config.safe_mode.freeze_updates = true;

    let read = collect_inputs(&StaticSource(inputs)).await.unwrap();
    assert_eq!(evaluate(&read).status, SafetyStatus::Unsafe);
}

#[tokio::test]
async fn test_all_green_is_safe() {
    let read = collect_inputs(&StaticSource(all_green())).await.unwrap();
    let assessment = evaluate(&read);
    assert_eq!(assessment.status, SafetyStatus::Safe);
    assert!(assessment.reasons.is_empty());
}

#[tokio::test]
async fn test_snapshot_file_is_reread() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("status.json");
    std::fs::write(
        &path,
        r#"{
            "runtime_config": {"profile": "v1_primary"},
            "irt_status": {"active": true, "eligible": true},
            "rank_status": {"mode": "shadow", "eligible": true},
            "graph_health": {"available": false, "detail": "replica lag 40s"}
        }"#,
    )
    .unwrap();

    let source = SnapshotFileSource::new(&path);
    let assessment = evaluate(&collect_inputs(&source).await.unwrap());
    assert_eq!(assessment.status, SafetyStatus::Unsafe);
    assert!(assessment.reasons[0].contains("IRT"));

    // Graph recovers; the next read picks it up
    std::fs::write(
        &path,
        r#"{
            "irt_status": {"active": true, "eligible": true},
            "rank_status": {"mode": "shadow", "eligible": true},
            "graph_health": {"available": true}
        }"#,
    )
    .unwrap();
    let assessment = evaluate(&collect_inputs(&source).await.unwrap());
    assert_eq!(assessment.status, SafetyStatus::Safe);
}

#[tokio::test]
async fn test_missing_snapshot_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let source = SnapshotFileSource::new(tmp.path().join("nope.json"));
    assert!(collect_inputs(&source).await.is_err());
}
