//! Audit log reader — filter, summarize and display change logs.
//!
//! Backs the `changegate log` command.

use crate::approval::ApprovalStatus;
use crate::audit::types::*;
use crate::pipeline::StepStatus;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and queries audit log files in one directory.
pub struct AuditReader {
    log_dir: PathBuf,
}

impl AuditReader {
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Read all entries from a session log file.
    pub fn read_session(&self, session_id: &str) -> Result<Vec<AuditEntry>> {
        let path = self.log_dir.join(format!("{}.jsonl", session_id));
        self.read_file(&path)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<AuditEntry>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file: {}", path.display()))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse log entry at line {}", i + 1))
            })
            .collect()
    }

    /// Read entries from the most recent session.
    pub fn read_latest_session(&self) -> Result<Vec<AuditEntry>> {
        match self.list_sessions()?.pop() {
            Some(session) => self.read_session(&session),
            None => Ok(Vec::new()),
        }
    }

    /// List all session ids, oldest first. Session ids are dates, so
    /// lexical order is chronological.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.log_dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions: Vec<String> = fs::read_dir(&self.log_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "jsonl"))
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .collect();

        sessions.sort();
        Ok(sessions)
    }

    /// Filter entries based on criteria.
    pub fn filter_entries(entries: &[AuditEntry], filter: &LogFilter) -> Vec<AuditEntry> {
        entries
            .iter()
            .filter(|e| {
                if let Some(ref operator) = filter.operator {
                    if e.operator != *operator {
                        return false;
                    }
                }
                if let Some(ref event) = filter.event {
                    if e.event.name() != event.as_str() {
                        return false;
                    }
                }
                if let Some(kind) = filter.kind {
                    if e.event.kind() != Some(kind) {
                        return false;
                    }
                }
                true
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Generate a summary for a set of log entries.
    pub fn summarize(entries: &[AuditEntry]) -> SessionSummary {
        let mut summary = SessionSummary::default();

        if let Some(first) = entries.first() {
            summary.session_id = first.session_id.clone();
            summary.start_time = Some(first.timestamp);
        }
        if let Some(last) = entries.last() {
            summary.end_time = Some(last.timestamp);
        }

        summary.total_events = entries.len();
        for entry in entries {
            if !summary.operators.contains(&entry.operator) {
                summary.operators.push(entry.operator.clone());
            }
            match &entry.event {
                AuditEvent::Staged { .. } => summary.staged += 1,
                AuditEvent::BatchStep { status, .. } => match status {
                    StepStatus::Success => summary.applied += 1,
                    StepStatus::Failed => summary.failed += 1,
                    StepStatus::Skipped => summary.skipped += 1,
                    StepStatus::Pending | StepStatus::Running => {}
                },
                AuditEvent::ApprovalRequested { .. } => summary.approvals_requested += 1,
                AuditEvent::ApprovalDecided { status, .. } => match status {
                    ApprovalStatus::Approved => summary.approved += 1,
                    ApprovalStatus::Rejected => summary.rejected += 1,
                    ApprovalStatus::Pending => {}
                },
                AuditEvent::Removed { .. }
                | AuditEvent::Cleared { .. }
                | AuditEvent::BatchRejected { .. }
                | AuditEvent::ApprovalFailed { .. } => {}
            }
        }

        summary
    }

    /// Pretty-print a log entry for terminal display.
    pub fn format_entry(entry: &AuditEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S").to_string();
        let (label, detail) = match &entry.event {
            AuditEvent::Staged {
                kind,
                risk,
                diff_summary,
                ..
            } => (
                "STAGED".cyan().to_string(),
                format!("{} ({}) {}", kind.to_string().bold(), risk, diff_summary),
            ),
            AuditEvent::Removed { kind, .. } => {
                ("REMOVED".dimmed().to_string(), kind.to_string().bold().to_string())
            }
            AuditEvent::Cleared { count } => (
                "CLEARED".dimmed().to_string(),
                format!("{} staged action(s)", count),
            ),
            AuditEvent::BatchRejected { error } => ("REFUSED".red().to_string(), error.clone()),
            AuditEvent::BatchStep {
                kind,
                status,
                error,
                ..
            } => {
                let label = match status {
                    StepStatus::Success => "APPLIED".green().to_string(),
                    StepStatus::Failed => "FAILED".red().to_string(),
                    StepStatus::Skipped => "SKIPPED".yellow().to_string(),
                    other => other.to_string().to_uppercase(),
                };
                let mut detail = kind.to_string().bold().to_string();
                if let Some(error) = error {
                    detail.push_str(&format!(" — {}", error));
                }
                (label, detail)
            }
            AuditEvent::ApprovalRequested { request_id, kind } => (
                "REQUESTED".yellow().to_string(),
                format!("{} ({})", kind.to_string().bold(), short(request_id)),
            ),
            AuditEvent::ApprovalDecided {
                request_id,
                kind,
                status,
            } => {
                let label = match status {
                    ApprovalStatus::Approved => "APPROVED".green().to_string(),
                    _ => "REJECTED".red().to_string(),
                };
                (label, format!("{} ({})", kind.to_string().bold(), short(request_id)))
            }
            AuditEvent::ApprovalFailed {
                request_id,
                kind,
                error,
            } => (
                "EXEC FAILED".red().to_string(),
                format!("{} ({}) — {}", kind.to_string().bold(), short(request_id), error),
            ),
        };

        let mut line = format!(
            "[{}] {} {} by {}",
            timestamp.dimmed(),
            label,
            detail,
            entry.operator
        );
        if let Some(ref reason) = entry.reason {
            line.push_str(&format!(" ({})", reason.dimmed()));
        }
        line
    }
}

fn short(id: &str) -> &str {
    &id[..id.len().min(8)]
}
