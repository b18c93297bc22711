//! Approval stores — the shared record of approval requests.
//!
//! The store stands in for the server: it is where other operators see
//! pending requests, and it is the authority on transitions. Every store
//! applies decisions through `ApprovalRequest::record_decision`, so the
//! pending-only and two-person checks hold no matter which client asks.

use crate::approval::types::{ApprovalRequest, Decision};
use crate::error::{ChangeError, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Record a new pending request.
    async fn submit(&self, request: ApprovalRequest) -> Result<ApprovalRequest>;

    /// Fetch one request by full id or unambiguous prefix.
    async fn get(&self, request_id: &str) -> Result<ApprovalRequest>;

    /// All requests, oldest first.
    async fn list(&self) -> Result<Vec<ApprovalRequest>>;

    /// Apply a decision and return the updated request.
    async fn decide(
        &self,
        request_id: &str,
        decision: Decision,
        operator: &str,
    ) -> Result<ApprovalRequest>;
}

fn find_index(requests: &[ApprovalRequest], request_id: &str) -> Result<usize> {
    if let Some(i) = requests.iter().position(|r| r.request_id == request_id) {
        return Ok(i);
    }
    if request_id.len() >= 4 {
        let mut matches = requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.request_id.starts_with(request_id));
        if let (Some((i, _)), None) = (matches.next(), matches.next()) {
            return Ok(i);
        }
    }
    Err(ChangeError::UnknownRequest(request_id.to_string()))
}

/// In-process store, for tests and embedding.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn submit(&self, request: ApprovalRequest) -> Result<ApprovalRequest> {
        self.requests.lock().await.push(request.clone());
        Ok(request)
    }

    async fn get(&self, request_id: &str) -> Result<ApprovalRequest> {
        let requests = self.requests.lock().await;
        let i = find_index(&requests, request_id)?;
        Ok(requests[i].clone())
    }

    async fn list(&self) -> Result<Vec<ApprovalRequest>> {
        Ok(self.requests.lock().await.clone())
    }

    async fn decide(
        &self,
        request_id: &str,
        decision: Decision,
        operator: &str,
    ) -> Result<ApprovalRequest> {
        let mut requests = self.requests.lock().await;
        let i = find_index(&requests, request_id)?;
        requests[i].record_decision(decision, operator)?;
        Ok(requests[i].clone())
    }
}

/// Store backed by a JSON file shared by every operator on the host.
///
/// Every operation holds an exclusive lock on a `.lock` sibling for its
/// whole read-modify-write, so concurrent CLI processes see each transition
/// exactly once. Writes go through a temp file and an atomic rename.
pub struct JsonFileApprovalStore {
    path: PathBuf,
}

impl JsonFileApprovalStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the exclusive lock. Released when the returned file is dropped.
    fn acquire(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChangeError::Store(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                ChangeError::Store(format!("failed to open {}: {}", lock_path.display(), e))
            })?;
        file.lock_exclusive().map_err(|e| {
            ChangeError::Store(format!("failed to lock {}: {}", lock_path.display(), e))
        })?;
        Ok(file)
    }

    /// Run `f` over the stored requests under the lock. When `f` reports
    /// a change, the file is rewritten before the lock is released.
    fn locked<T>(
        &self,
        f: impl FnOnce(&mut Vec<ApprovalRequest>) -> Result<(T, bool)>,
    ) -> Result<T> {
        let _lock = self.acquire()?;
        let mut requests = self.load()?;
        let (value, dirty) = f(&mut requests)?;
        if dirty {
            self.save(&requests)?;
        }
        Ok(value)
    }

    fn load(&self) -> Result<Vec<ApprovalRequest>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ChangeError::Store(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            ChangeError::Store(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, requests: &[ApprovalRequest]) -> Result<()> {
        let json = serde_json::to_string_pretty(requests)
            .map_err(|e| ChangeError::Store(format!("failed to serialize requests: {}", e)))?;

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            ChangeError::Store(format!("failed to create temp file in {}: {}", parent.display(), e))
        })?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ChangeError::Store(format!("failed to write temp file: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            ChangeError::Store(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ApprovalStore for JsonFileApprovalStore {
    async fn submit(&self, request: ApprovalRequest) -> Result<ApprovalRequest> {
        self.locked(|requests| {
            requests.push(request.clone());
            Ok((request, true))
        })
    }

    async fn get(&self, request_id: &str) -> Result<ApprovalRequest> {
        self.locked(|requests| {
            let i = find_index(requests, request_id)?;
            Ok((requests[i].clone(), false))
        })
    }

    async fn list(&self) -> Result<Vec<ApprovalRequest>> {
        self.locked(|requests| Ok((requests.clone(), false)))
    }

    async fn decide(
        &self,
        request_id: &str,
        decision: Decision,
        operator: &str,
    ) -> Result<ApprovalRequest> {
        self.locked(|requests| {
            let i = find_index(requests, request_id)?;
            requests[i].record_decision(decision, operator)?;
            Ok((requests[i].clone(), true))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::ApprovalStatus;
    use crate::registry::ActionKind;
    use chrono::Utc;
    use serde_json::Value;
    use tempfile::TempDir;

    fn request(id: &str, by: &str) -> ApprovalRequest {
        ApprovalRequest {
            request_id: id.to_string(),
            kind: ActionKind::SwitchRuntimePrimary,
            payload: Value::Null,
            reason: "v1 scoring validated in shadow".to_string(),
            confirmation_phrase: "SWITCH TO V1_PRIMARY".to_string(),
            status: ApprovalStatus::Pending,
            requested_by: by.to_string(),
            requested_at: Utc::now(),
            approved_by: None,
            rejected_by: None,
            decided_at: None,
        }
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("approvals.json");

        let store = JsonFileApprovalStore::new(&path);
        store.submit(request("abcd-1234", "alice")).await.unwrap();
        drop(store);

        let store = JsonFileApprovalStore::new(&path);
        let decided = store.decide("abcd", Decision::Approve, "bob").await.unwrap();
        assert_eq!(decided.status, ApprovalStatus::Approved);

        let reopened = JsonFileApprovalStore::new(&path);
        let listed = reopened.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].approved_by.as_deref(), Some("bob"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_instances_do_not_lose_writes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("approvals.json");

        let handles: Vec<_> = (0..16)
            .map(|n| {
                let path = path.clone();
                tokio::spawn(async move {
                    JsonFileApprovalStore::new(&path)
                        .submit(request(&format!("req-{:04}", n), "alice"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let listed = JsonFileApprovalStore::new(&path).list().await.unwrap();
        assert_eq!(listed.len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_decisions_transition_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("approvals.json");
        JsonFileApprovalStore::new(&path)
            .submit(request("race-0001", "alice"))
            .await
            .unwrap();

        let approve = {
            let path = path.clone();
            tokio::spawn(async move {
                JsonFileApprovalStore::new(&path)
                    .decide("race-0001", Decision::Approve, "bob")
                    .await
            })
        };
        let reject = {
            let path = path.clone();
            tokio::spawn(async move {
                JsonFileApprovalStore::new(&path)
                    .decide("race-0001", Decision::Reject, "carol")
                    .await
            })
        };
        let outcomes = [approve.await.unwrap(), reject.await.unwrap()];

        let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, Err(ChangeError::AlreadyDecided { .. }))));

        let stored = JsonFileApprovalStore::new(&path).get("race-0001").await.unwrap();
        assert_eq!(stored.status, winners[0].status);
        assert!(stored.approved_by.is_none() || stored.rejected_by.is_none());
    }

    #[tokio::test]
    async fn test_store_enforces_two_person_rule() {
        let store = InMemoryApprovalStore::new();
        store.submit(request("req-0001", "alice")).await.unwrap();
        let err = store
            .decide("req-0001", Decision::Approve, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::SelfApproval { .. }));
        assert!(store.get("req-0001").await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let store = InMemoryApprovalStore::new();
        assert!(matches!(
            store.get("missing").await,
            Err(ChangeError::UnknownRequest(_))
        ));
    }
}
