//! `changegate stage | remove | clear | list | actions` — queue bookkeeping.
//!
//! Nothing here executes an action. Staging only records intent.

use crate::audit::AuditEvent;
use crate::cli::context::{audit, open_logger, Workspace};
use crate::cli::parse_payload;
use crate::registry::RiskLevel;
use crate::staging::StagedAction;
use anyhow::Result;
use colored::Colorize;

pub fn run_stage(
    workspace: &Workspace,
    kind: &str,
    payload: Option<&str>,
    summary: Option<&str>,
) -> Result<()> {
    let payload = parse_payload(payload)?;
    let mut queue = workspace.load_queue()?;
    let mut logger = open_logger(workspace);

    let resolved = workspace.registry.resolve_kind(kind)?;
    let requirements = workspace.registry.requirements(resolved, &payload)?;
    let diff_summary = summary
        .map(str::to_string)
        .unwrap_or_else(|| requirements.title.clone());

    let action = queue.stage(&workspace.registry, resolved, payload, diff_summary)?;
    workspace.save_queue(&queue)?;

    audit(
        &mut logger,
        AuditEvent::Staged {
            action_id: action.id.clone(),
            kind: action.kind,
            risk: action.risk,
            diff_summary: action.diff_summary.clone(),
        },
        None,
    );

    println!();
    println!("  {} Staged {}", "✓".green().bold(), format_action(&action));
    println!(
        "  {} change(s) staged. Nothing has been applied yet.",
        queue.len().to_string().bold()
    );
    println!(
        "  Apply with: {}",
        format!("changegate apply --reason \"...\" --confirm \"{}\"", workspace.config.batch_phrase)
            .dimmed()
    );
    println!();
    Ok(())
}

pub fn run_remove(workspace: &Workspace, id: &str) -> Result<()> {
    let mut queue = workspace.load_queue()?;
    let mut logger = open_logger(workspace);

    let removed = queue.remove(id)?;
    workspace.save_queue(&queue)?;

    audit(
        &mut logger,
        AuditEvent::Removed {
            action_id: removed.id.clone(),
            kind: removed.kind,
        },
        None,
    );

    println!();
    println!("  {} Removed {}", "✓".green().bold(), format_action(&removed));
    println!("  {} change(s) still staged.", queue.len());
    println!();
    Ok(())
}

pub fn run_clear(workspace: &Workspace) -> Result<()> {
    let mut queue = workspace.load_queue()?;
    let mut logger = open_logger(workspace);

    let count = queue.clear();
    workspace.save_queue(&queue)?;
    audit(&mut logger, AuditEvent::Cleared { count }, None);

    println!();
    println!("  {} Cleared {} staged change(s).", "✓".green().bold(), count);
    println!();
    Ok(())
}

pub fn run_list(workspace: &Workspace) -> Result<()> {
    let queue = workspace.load_queue()?;

    println!();
    if !queue.has_changes() {
        println!("  {} No staged changes.", "ℹ".blue());
        println!("  Stage one with: {}", "changegate stage <action>".dimmed());
        println!();
        return Ok(());
    }

    println!(
        "  {} staged change(s), applied in this order:",
        queue.len().to_string().bold()
    );
    println!();
    for (i, action) in queue.list().iter().enumerate() {
        println!("  {}. {}", i + 1, format_action(action));
        println!(
            "     {} {}",
            "staged".dimmed(),
            action.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }
    println!();
    Ok(())
}

pub fn run_actions(workspace: &Workspace) -> Result<()> {
    println!();
    println!(
        "  {} registered actions ({})",
        workspace.registry.len().to_string().bold(),
        workspace.config.registry.cyan()
    );
    println!();
    for spec in workspace.registry.specs() {
        println!(
            "  {:<24} {:<8} {}",
            spec.kind.to_string().bold(),
            risk_label(spec.risk),
            spec.title
        );
        println!("  {:<24} {:<8} phrase: {}", "", "", spec.phrase.cyan());
    }
    println!();
    println!(
        "  Batch confirmation phrase: {}",
        workspace.config.batch_phrase.cyan()
    );
    println!();
    Ok(())
}

pub(crate) fn risk_label(risk: RiskLevel) -> String {
    match risk {
        RiskLevel::High => "HIGH".red().bold().to_string(),
        RiskLevel::Medium => "MEDIUM".yellow().to_string(),
        RiskLevel::Low => "low".dimmed().to_string(),
    }
}

pub(crate) fn format_action(action: &StagedAction) -> String {
    format!(
        "{} {} [{}] {}",
        action.short_id().dimmed(),
        action.kind.to_string().bold(),
        risk_label(action.risk),
        action.diff_summary
    )
}
