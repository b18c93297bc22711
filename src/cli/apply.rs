//! `changegate apply` — run the staged queue as one batch.
//!
//! Prints each step as it happens, then the three-way breakdown and the
//! rollback suggestions for whatever succeeded. Every finished step is
//! written to the audit log and to `queue.json` before the next one starts,
//! so a crash mid-batch never re-stages an action that already ran.

use crate::audit::AuditEvent;
use crate::cli::context::{audit, open_logger, Workspace};
use crate::cli::stage::format_action;
use crate::cli::value_or_prompt;
use crate::pipeline::{ApplyProgress, BatchPipeline, BatchRequest, BatchResult, StepStatus};
use crate::staging::{StagedAction, StagedQueue};
use anyhow::{bail, Result};
use colored::Colorize;
use std::collections::HashMap;

pub struct ApplyOptions {
    pub reason: Option<String>,
    pub confirm: Option<String>,
    pub dry_run: bool,
}

pub async fn run_apply(workspace: &Workspace, options: ApplyOptions) -> Result<()> {
    let mut queue = workspace.load_queue()?;
    let pipeline = workspace.pipeline(options.dry_run);

    if !queue.has_changes() {
        println!();
        println!("  {} Nothing staged. Nothing to apply.", "ℹ".blue());
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  {} staged change(s) will be applied in order{}:",
        queue.len().to_string().bold(),
        if options.dry_run { " (dry run)".yellow().to_string() } else { String::new() }
    );
    for (i, action) in queue.list().iter().enumerate() {
        println!("    {}. {}", i + 1, format_action(action));
    }
    println!();

    let reason = value_or_prompt(options.reason, "Reason for this change")?;
    let confirm = value_or_prompt(
        options.confirm,
        &format!("Type \"{}\" to confirm", pipeline.batch_phrase()),
    )?;
    let request = BatchRequest::new(reason, confirm);

    if options.dry_run {
        return dry_run(&pipeline, queue, &request).await;
    }

    let mut logger = open_logger(workspace);
    let by_id: HashMap<String, StagedAction> = queue
        .list()
        .iter()
        .map(|a| (a.id.clone(), a.clone()))
        .collect();

    // Mirror of queue.json, updated as each step lands
    let mut on_disk = queue.clone();
    let run_reason = request.reason.trim().to_string();

    let outcome = pipeline
        .apply(&mut queue, &request, |progress| {
            print_progress(&by_id, progress);
            if !progress.status.is_terminal() {
                return;
            }
            if let Some(action) = by_id.get(&progress.action_id) {
                audit(
                    &mut logger,
                    AuditEvent::BatchStep {
                        run_id: request.run_id.clone(),
                        action_id: action.id.clone(),
                        kind: action.kind,
                        status: progress.status,
                        error: progress.error.clone(),
                    },
                    Some(run_reason.as_str()),
                );
            }
            if progress.status == StepStatus::Success && on_disk.remove(&progress.action_id).is_ok() {
                if let Err(e) = workspace.save_queue(&on_disk) {
                    tracing::error!("Failed to persist queue after {}: {:#}", progress.action_id, e);
                }
            }
        })
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            audit(
                &mut logger,
                AuditEvent::BatchRejected {
                    error: e.to_string(),
                },
                Some(run_reason.as_str()),
            );
            return Err(e.into());
        }
    };

    // Succeeded actions are gone from the queue; failed/skipped stay staged
    workspace.save_queue(&queue)?;

    print_result(&result);
    if !result.is_full_success() {
        println!(
            "  {} change(s) remain staged. Fix the failure and run apply again, or remove them.",
            queue.len().to_string().bold()
        );
        println!();
        bail!(
            "{} of {} staged change(s) were not applied ({} failed, {} skipped)",
            result.failed.len() + result.skipped.len(),
            result.total(),
            result.failed.len(),
            result.skipped.len()
        );
    }
    Ok(())
}

/// Walk the batch through the pipeline without executing anything. The
/// queue on disk and the audit log are left alone.
async fn dry_run(pipeline: &BatchPipeline, mut queue: StagedQueue, request: &BatchRequest) -> Result<()> {
    let by_id: HashMap<String, StagedAction> = queue
        .list()
        .iter()
        .map(|a| (a.id.clone(), a.clone()))
        .collect();

    let result = pipeline
        .apply(&mut queue, request, |progress| print_progress(&by_id, progress))
        .await?;

    println!();
    println!(
        "  {} Dry run: {} change(s) checked, nothing executed. The queue is unchanged.",
        "ℹ".blue(),
        result.succeeded.len().to_string().bold()
    );
    println!();
    Ok(())
}

fn print_progress(by_id: &HashMap<String, StagedAction>, progress: &ApplyProgress) {
    let name = by_id
        .get(&progress.action_id)
        .map(|a| a.kind.to_string())
        .unwrap_or_else(|| progress.action_id.clone());

    match progress.status {
        StepStatus::Running => println!("  {} {}...", "→".blue(), name.bold()),
        StepStatus::Success => println!(
            "  {} {} {}",
            "✓".green().bold(),
            name,
            progress.message.as_deref().unwrap_or("").dimmed()
        ),
        StepStatus::Failed => println!(
            "  {} {}: {}",
            "✗".red().bold(),
            name,
            progress.error.as_deref().unwrap_or("failed").red()
        ),
        StepStatus::Skipped => println!("  {} {} (skipped)", "○".yellow(), name.dimmed()),
        StepStatus::Pending => {}
    }
}

fn print_result(result: &BatchResult) {
    println!();
    println!(
        "  {} {} succeeded | {} failed | {} skipped",
        "Result:".bold(),
        result.succeeded.len().to_string().green().bold(),
        result.failed.len().to_string().red().bold(),
        result.skipped.len().to_string().yellow().bold(),
    );
    println!("  Run: {}", result.run_id.dimmed());

    if !result.rollback_suggestions.is_empty() {
        println!();
        println!("  {} To undo what was applied:", "↺".cyan());
        for suggestion in &result.rollback_suggestions {
            println!(
                "    • {}: {}",
                suggestion.kind.to_string().bold(),
                suggestion.suggestion
            );
        }
    }
    println!();
}
