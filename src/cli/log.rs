//! `changegate log` — browse the change audit log.
//!
//! Answers "what actually changed in production, and who did it": every
//! staged action, every batch step, every approval decision.

use crate::audit::{AuditReader, LogFilter};
use crate::cli::context::Workspace;
use crate::registry::ActionKind;
use anyhow::{Context, Result};
use colored::Colorize;

pub struct LogOptions<'a> {
    pub session: Option<&'a str>,
    pub operator: Option<&'a str>,
    pub event: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub limit: Option<usize>,
    pub summary_only: bool,
}

/// Run the `changegate log` command.
pub fn run_log(workspace: &Workspace, options: LogOptions<'_>) -> Result<()> {
    let reader = AuditReader::with_dir(workspace.log_dir());

    let entries = if let Some(sid) = options.session {
        reader
            .read_session(sid)
            .with_context(|| format!("Failed to read session: {}", sid))?
    } else {
        reader.read_latest_session()?
    };
    if entries.is_empty() {
        println!();
        println!("  {} No audit logs found.", "ℹ".blue());
        println!("  Stage and apply a change first:");
        println!("    {}", "changegate stage <action>".dimmed());
        println!();
        return Ok(());
    }

    let kind = match options.kind {
        Some(raw) => Some(
            ActionKind::from_str_loose(raw)
                .with_context(|| format!("Unknown action type: {}", raw))?,
        ),
        None => None,
    };
    let filter = LogFilter {
        operator: options.operator.map(str::to_string),
        event: options.event.map(|e| e.trim().to_lowercase()),
        kind,
        limit: options.limit,
    };

    let summary = AuditReader::summarize(&entries);
    if options.summary_only {
        println!();
        println!("  {} Session: {}", "📋".to_string().bold(), summary.session_id.cyan());
        println!("  Operators: {}", summary.operators.join(", "));
        println!();
        println!(
            "  {} staged | {} applied | {} failed | {} skipped",
            summary.staged.to_string().bold(),
            summary.applied.to_string().green().bold(),
            summary.failed.to_string().red().bold(),
            summary.skipped.to_string().yellow().bold(),
        );
        println!(
            "  {} approvals requested | {} approved | {} rejected",
            summary.approvals_requested.to_string().bold(),
            summary.approved.to_string().green().bold(),
            summary.rejected.to_string().red().bold(),
        );
        if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
            println!("  Span: {}", format_duration((end - start).num_seconds()));
        }
        println!();
        return Ok(());
    }

    let filtered = AuditReader::filter_entries(&entries, &filter);
    println!();
    println!("  Session: {}", summary.session_id.cyan());
    println!();
    for entry in &filtered {
        println!("  {}", AuditReader::format_entry(entry));
    }
    println!();
    println!("  {} {}", "─".repeat(40).dimmed(), summary.one_line().dimmed());
    println!();
    Ok(())
}

/// List available sessions.
pub fn run_log_list(workspace: &Workspace) -> Result<()> {
    let sessions = AuditReader::with_dir(workspace.log_dir()).list_sessions()?;

    println!();
    if sessions.is_empty() {
        println!("  {} No sessions found.", "ℹ".blue());
        println!();
        return Ok(());
    }

    println!("  {} Available sessions:", "📋".to_string().bold());
    println!();
    for session in &sessions {
        println!("  • {}", session);
    }
    println!();
    println!("  View a session: {}", "changegate log --session <date>".dimmed());
    println!();
    Ok(())
}

fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
