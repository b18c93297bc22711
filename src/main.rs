//! changegate — change control for high-risk production admin actions.
//!
//! Quick start:
//!   changegate                      # safety verdict + staged changes
//!   changegate stage <action>       # stage a change (nothing runs yet)
//!   changegate apply                # justify, confirm, apply the batch
//!   changegate log                  # what actually changed, and who did it
//!
//! For more info: changegate --help

use changegate::cli::{self, context::GlobalOptions, context::Workspace};
use changegate::{audit, config, safety};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// changegate — stage, justify and confirm every production admin change.
#[derive(Parser)]
#[command(
    name = "changegate",
    version,
    about = "Change control for high-risk production admin actions",
    long_about = "changegate stands between operators and production admin endpoints.\n\
                  Changes are staged first, applied as one batch behind a written\n\
                  reason and a typed confirmation phrase, and logged.\n\n\
                  Quick start:\n  \
                  changegate stage activate_irt     # stage a change\n  \
                  changegate apply                  # apply the staged batch\n  \
                  changegate log                    # see what changed"
)]
struct Cli {
    /// Config file (default: .changegate.yaml, searched upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Operator identity recorded on every change
    #[arg(long, global = true, env = "CHANGEGATE_OPERATOR")]
    operator: Option<String>,

    /// Where the queue, approvals and logs live
    #[arg(long, global = true, env = "CHANGEGATE_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage a change (nothing is executed)
    Stage {
        /// Action type, e.g. activate_irt
        action: String,

        /// Action payload as JSON, e.g. '{"engine":"bm25"}'
        #[arg(short, long)]
        payload: Option<String>,

        /// One-line description shown in the staged list
        #[arg(short, long)]
        summary: Option<String>,
    },

    /// Remove one staged change by id (or a unique prefix)
    Remove { id: String },

    /// Drop every staged change
    Clear,

    /// Show staged changes in apply order
    #[command(alias = "diff")]
    List,

    /// Apply every staged change as one batch
    Apply {
        /// Written justification (prompted if missing)
        #[arg(short, long)]
        reason: Option<String>,

        /// Batch confirmation phrase (prompted if missing)
        #[arg(short, long)]
        confirm: Option<String>,

        /// Walk the batch without executing anything or changing the queue
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a second operator to approve a single action
    Request {
        action: String,
        #[arg(short, long)]
        payload: Option<String>,
        #[arg(short, long)]
        reason: Option<String>,
        #[arg(short, long)]
        confirm: Option<String>,
    },

    /// Approve (and execute) a pending request
    Approve {
        request_id: String,
        #[arg(short, long)]
        confirm: Option<String>,
    },

    /// Reject a pending request
    Reject { request_id: String },

    /// List approval requests waiting for a decision
    Pending {
        /// Include decided requests
        #[arg(long)]
        all: bool,
    },

    /// Show the safety verdict for the current subsystem status
    Status {
        /// Status snapshot JSON (default: status_snapshot from the config)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List registered actions, their risk and confirmation phrases
    Actions,

    /// Validate the config file
    Check,

    /// See what changed
    Log {
        /// Session (UTC date, YYYY-MM-DD)
        #[arg(short, long)]
        session: Option<String>,

        /// Only entries by this operator
        #[arg(short, long)]
        operator_filter: Option<String>,

        /// Filter by event: staged, batch_step, approval_decided, ...
        #[arg(short, long)]
        event: Option<String>,

        /// Filter by action type
        #[arg(short, long)]
        action: Option<String>,

        #[arg(short, long, help = "Max entries to show")]
        limit: Option<usize>,

        #[arg(long, help = "Show only the session summary")]
        summary: bool,

        #[arg(long, help = "List all recorded sessions")]
        list: bool,
    },

    /// Write a starter .changegate.yaml
    Init {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    // Quiet unless RUST_LOG asks for more
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "changegate=warn".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        operator: cli.operator,
        state_dir: cli.state_dir,
    };

    let result = match cli.command {
        // init must work before any config exists
        Some(Commands::Init { output, force }) => {
            cli::init::run_init(output.as_deref(), force).map(|_| ())
        }
        command => match Workspace::load(&options) {
            Ok(workspace) => dispatch(&workspace, command).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}

async fn dispatch(workspace: &Workspace, command: Option<Commands>) -> anyhow::Result<()> {
    match command {
        None => show_overview(workspace).await,

        Some(Commands::Stage {
            action,
            payload,
            summary,
        }) => cli::stage::run_stage(workspace, &action, payload.as_deref(), summary.as_deref()),
        Some(Commands::Remove { id }) => cli::stage::run_remove(workspace, &id),
        Some(Commands::Clear) => cli::stage::run_clear(workspace),
        Some(Commands::List) => cli::stage::run_list(workspace),
        Some(Commands::Actions) => cli::stage::run_actions(workspace),

        Some(Commands::Apply {
            reason,
            confirm,
            dry_run,
        }) => {
            cli::apply::run_apply(
                workspace,
                cli::apply::ApplyOptions {
                    reason,
                    confirm,
                    dry_run,
                },
            )
            .await
        }

        Some(Commands::Request {
            action,
            payload,
            reason,
            confirm,
        }) => {
            cli::approval::run_request(
                workspace,
                cli::approval::RequestOptions {
                    kind: action,
                    payload,
                    reason,
                    confirm,
                },
            )
            .await
        }
        Some(Commands::Approve {
            request_id,
            confirm,
        }) => cli::approval::run_approve(workspace, &request_id, confirm).await,
        Some(Commands::Reject { request_id }) => {
            cli::approval::run_reject(workspace, &request_id).await
        }
        Some(Commands::Pending { all }) => cli::approval::run_pending(workspace, all).await,

        Some(Commands::Status { snapshot }) => {
            cli::status::run_status(workspace, snapshot.as_deref()).await
        }

        Some(Commands::Check) => run_check(workspace),

        Some(Commands::Log {
            session,
            operator_filter,
            event,
            action,
            limit,
            summary,
            list,
        }) => {
            if list {
                cli::log::run_log_list(workspace)
            } else {
                cli::log::run_log(
                    workspace,
                    cli::log::LogOptions {
                        session: session.as_deref(),
                        operator: operator_filter.as_deref(),
                        event: event.as_deref(),
                        kind: action.as_deref(),
                        limit,
                        summary_only: summary,
                    },
                )
            }
        }

        // Handled before the workspace is loaded
        Some(Commands::Init { .. }) => Ok(()),
    }
}

/// `changegate` with no arguments: safety verdict, staged changes, pending
/// approvals, and the day's activity.
async fn show_overview(workspace: &Workspace) -> anyhow::Result<()> {
    println!();
    println!(
        "  {}  {}",
        "changegate".bold(),
        format!("— {}", workspace.config.registry).dimmed()
    );
    println!("  {}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".dimmed());
    println!();
    println!("  Operator: {}", workspace.operator.cyan());
    println!("  Config:   {}", workspace.config_display().dimmed());

    if let Some(path) = workspace.config.status_snapshot_path() {
        let source = safety::SnapshotFileSource::new(&path);
        match safety::collect_inputs(&source).await {
            Ok(inputs) => {
                let assessment = safety::evaluate(&inputs);
                let verdict = match assessment.status {
                    safety::SafetyStatus::Safe => "SAFE".green().bold(),
                    safety::SafetyStatus::Caution => "CAUTION".yellow().bold(),
                    safety::SafetyStatus::Unsafe => "UNSAFE".red().bold(),
                };
                println!("  Safety:   {}", verdict);
            }
            Err(e) => println!("  Safety:   {} ({:#})", "unknown".dimmed(), e),
        }
    }

    let queue = workspace.load_queue()?;
    println!("  Staged:   {} change(s)", queue.len().to_string().bold());

    match workspace.workflow().pending().await {
        Ok(pending) => println!("  Pending:  {} approval request(s)", pending.len().to_string().bold()),
        Err(e) => tracing::warn!("Could not read approvals: {}", e),
    }

    let reader = audit::AuditReader::with_dir(workspace.log_dir());
    if let Ok(entries) = reader.read_latest_session() {
        if !entries.is_empty() {
            let summary = audit::AuditReader::summarize(&entries);
            println!(
                "  Today:    {} applied, {} failed, {} approved",
                summary.applied.to_string().green(),
                summary.failed.to_string().red(),
                summary.approved.to_string().green(),
            );
        }
    }

    println!();
    println!("  {}", "Commands:".dimmed());
    println!("    {}   stage a change", "changegate stage".bold());
    println!("    {}   apply the staged batch", "changegate apply".bold());
    println!("    {}  safety verdict details", "changegate status".bold());
    println!("    {}     see what changed", "changegate log".bold());
    println!();
    Ok(())
}

/// Run the `changegate check` command with linting.
fn run_check(workspace: &Workspace) -> anyhow::Result<()> {
    if workspace.config_path.is_none() {
        anyhow::bail!(
            "No {} found — run `changegate init` or pass --config",
            changegate::utils::paths::CONFIG_FILE_NAME
        );
    }
    let parsed = &workspace.config;
    let registry = &workspace.registry;

    println!();
    println!("  {} Config is valid!", "✓".green().bold());
    println!("  Registry: {}", parsed.registry.cyan());
    println!("  Actions:  {}", registry.len());
    println!("  Executors: {}", parsed.executors.len());

    let warnings = config::linter::lint_config(parsed, registry);
    println!();
    if warnings.is_empty() {
        println!("  {} No issues found — config looks solid.", "✓".green());
    } else {
        println!(
            "  {} {} {}:",
            "─".repeat(20).dimmed(),
            warnings.len(),
            if warnings.len() == 1 { "suggestion" } else { "suggestions" }
        );
        println!();
        for warning in &warnings {
            println!("{}", warning.display());
        }
    }
    println!();
    Ok(())
}
