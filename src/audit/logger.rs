//! Audit log writer — append-only JSONL files.
//!
//! Writes to `<state_dir>/logs/{YYYY-MM-DD}.jsonl`, one JSON object per
//! line. Flushes after every write so a crash mid-batch still leaves a record
//! of every step that ran.

use crate::audit::types::{AuditEntry, AuditEvent};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only audit logger that writes JSONL files.
pub struct AuditLogger {
    log_path: PathBuf,
    file: File,
    session_id: String,
    operator: String,
    entry_count: usize,
}

impl AuditLogger {
    /// Open today's log in `log_dir`, creating it if needed.
    pub fn open_daily(log_dir: impl AsRef<Path>, operator: &str) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let session_id = Utc::now().format("%Y-%m-%d").to_string();
        let log_path = log_dir.join(format!("{}.jsonl", session_id));
        Self::open(log_path, session_id, operator)
    }

    /// Create a logger writing to a specific path (for testing).
    pub fn with_path(path: impl AsRef<Path>, operator: &str) -> Result<Self> {
        let log_path = path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let session_id = log_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "session".to_string());
        Self::open(log_path, session_id, operator)
    }

    fn open(log_path: PathBuf, session_id: String, operator: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        Ok(Self {
            log_path,
            file,
            session_id,
            operator: operator.to_string(),
            entry_count: 0,
        })
    }

    /// Append an entry. Serializes to JSON and flushes immediately.
    pub fn log(&mut self, entry: &AuditEntry) -> Result<()> {
        let json = serde_json::to_string(entry).context("Failed to serialize log entry")?;
        writeln!(self.file, "{}", json).context("Failed to write log entry")?;
        self.file.flush().context("Failed to flush log file")?;
        self.entry_count += 1;
        Ok(())
    }

    /// Log an event as this logger's operator, with an optional reason.
    pub fn record(&mut self, event: AuditEvent, reason: Option<&str>) -> Result<()> {
        let mut entry = AuditEntry::new(&self.session_id, &self.operator, event);
        if let Some(reason) = reason {
            entry = entry.with_reason(reason);
        }
        self.log(&entry)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}
