//! `changegate request | approve | reject | pending` — two-person approval.
//!
//! A request is created by one operator and decided by another. Approving
//! executes the action once; if execution fails the request stays pending.

use crate::approval::{ApprovalRequest, ApprovalStatus, ApprovalStore};
use crate::audit::AuditEvent;
use crate::cli::context::{audit, open_logger, Workspace};
use crate::cli::stage::risk_label;
use crate::cli::{parse_payload, value_or_prompt};
use crate::error::ChangeError;
use anyhow::Result;
use colored::Colorize;

pub struct RequestOptions {
    pub kind: String,
    pub payload: Option<String>,
    pub reason: Option<String>,
    pub confirm: Option<String>,
}

pub async fn run_request(workspace: &Workspace, options: RequestOptions) -> Result<()> {
    let payload = parse_payload(options.payload.as_deref())?;
    let kind = workspace.registry.resolve_kind(&options.kind)?;
    let requirements = workspace.registry.requirements(kind, &payload)?;

    println!();
    println!(
        "  {} [{}] {}",
        kind.to_string().bold(),
        risk_label(requirements.risk),
        requirements.title
    );
    println!();

    let reason = value_or_prompt(options.reason, "Reason for this change")?;
    let confirm = value_or_prompt(
        options.confirm,
        &format!("Type \"{}\" to confirm", requirements.required_phrase),
    )?;

    let workflow = workspace.workflow();
    let request = workflow.request(kind, payload, &reason, &confirm).await?;

    let mut logger = open_logger(workspace);
    audit(
        &mut logger,
        AuditEvent::ApprovalRequested {
            request_id: request.request_id.clone(),
            kind: request.kind,
        },
        Some(request.reason.as_str()),
    );

    println!(
        "  {} Approval requested: {}",
        "✓".green().bold(),
        request.short_id().bold()
    );
    println!("  Nothing runs until a second operator approves it:");
    println!(
        "    {}",
        format!("changegate approve {}", request.short_id()).dimmed()
    );
    println!();
    Ok(())
}

pub async fn run_approve(
    workspace: &Workspace,
    request_id: &str,
    confirm: Option<String>,
) -> Result<()> {
    let workflow = workspace.workflow();
    let store = workspace.approval_store();

    // Show what is being approved before asking for the phrase
    let request = store.get(request_id).await?;
    print_request(&request);
    let requirements = workspace
        .registry
        .requirements(request.kind, &request.payload)?;
    let confirm = value_or_prompt(
        confirm,
        &format!("Type \"{}\" to approve", requirements.required_phrase),
    )?;

    let mut logger = open_logger(workspace);
    match workflow.approve(&request.request_id, &confirm).await {
        Ok(approved) => {
            audit(
                &mut logger,
                AuditEvent::ApprovalDecided {
                    request_id: approved.request_id.clone(),
                    kind: approved.kind,
                    status: approved.status,
                },
                None,
            );
            println!();
            println!(
                "  {} Approved and applied {} ({})",
                "✓".green().bold(),
                approved.kind.to_string().bold(),
                approved.short_id()
            );
            println!(
                "  To undo: {}",
                workspace.registry.rollback_hint(approved.kind, &approved.payload)
            );
            println!();
            Ok(())
        }
        Err(e) => {
            if let ChangeError::ExecutionFailed { ref message, .. } = e {
                audit(
                    &mut logger,
                    AuditEvent::ApprovalFailed {
                        request_id: request.request_id.clone(),
                        kind: request.kind,
                        error: message.clone(),
                    },
                    None,
                );
                eprintln!();
                eprintln!(
                    "  {} Request {} is still pending and can be approved again.",
                    "ℹ".blue(),
                    request.short_id()
                );
            }
            Err(e.into())
        }
    }
}

pub async fn run_reject(workspace: &Workspace, request_id: &str) -> Result<()> {
    let workflow = workspace.workflow();
    let rejected = workflow.reject(request_id).await?;

    let mut logger = open_logger(workspace);
    audit(
        &mut logger,
        AuditEvent::ApprovalDecided {
            request_id: rejected.request_id.clone(),
            kind: rejected.kind,
            status: rejected.status,
        },
        None,
    );

    println!();
    println!(
        "  {} Rejected {} ({}). Nothing was executed.",
        "✓".green().bold(),
        rejected.kind.to_string().bold(),
        rejected.short_id()
    );
    println!();
    Ok(())
}

pub async fn run_pending(workspace: &Workspace, all: bool) -> Result<()> {
    let workflow = workspace.workflow();
    let requests = if all {
        workflow.history().await?
    } else {
        workflow.pending().await?
    };

    println!();
    if requests.is_empty() {
        println!(
            "  {} No {}approval requests.",
            "ℹ".blue(),
            if all { "" } else { "pending " }
        );
        println!();
        return Ok(());
    }

    for request in &requests {
        print_request(request);
    }
    Ok(())
}

fn print_request(request: &ApprovalRequest) {
    let status = match request.status {
        ApprovalStatus::Pending => "PENDING".yellow().to_string(),
        ApprovalStatus::Approved => "APPROVED".green().to_string(),
        ApprovalStatus::Rejected => "REJECTED".red().to_string(),
    };
    println!(
        "  {} {} {}",
        request.short_id().dimmed(),
        status,
        request.kind.to_string().bold()
    );
    println!(
        "     requested by {} at {}",
        request.requested_by.cyan(),
        request.requested_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("     reason: {}", request.reason);
    if !request.payload.is_null() {
        println!("     payload: {}", request.payload.to_string().dimmed());
    }
    if let Some(ref by) = request.approved_by {
        println!("     approved by {}", by.green());
    }
    if let Some(ref by) = request.rejected_by {
        println!("     rejected by {}", by.red());
    }
    println!();
}
