//! `changegate status` — current safety verdict from a status snapshot.

use crate::cli::context::{absolute, Workspace};
use crate::safety::{self, RankingMode, SafetyInputs, SafetyStatus, SnapshotFileSource};
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

pub async fn run_status(workspace: &Workspace, snapshot: Option<&Path>) -> Result<()> {
    let path = match snapshot {
        Some(p) => absolute(p),
        None => match workspace.config.status_snapshot_path() {
            Some(p) => p,
            None => bail!(
                "No status snapshot configured — pass --snapshot or set status_snapshot in {}",
                workspace.config_display()
            ),
        },
    };

    let source = SnapshotFileSource::new(&path);
    let inputs = safety::collect_inputs(&source).await?;
    let assessment = safety::evaluate(&inputs);

    let verdict = match assessment.status {
        SafetyStatus::Safe => "SAFE".green().bold(),
        SafetyStatus::Caution => "CAUTION".yellow().bold(),
        SafetyStatus::Unsafe => "UNSAFE".red().bold(),
    };

    println!();
    println!("  Safety: {}", verdict);
    for reason in &assessment.reasons {
        println!("    • {}", reason);
    }
    println!();
    print_inputs(&inputs);
    println!("  Snapshot: {}", path.display().to_string().dimmed());
    println!();
    Ok(())
}

fn print_inputs(inputs: &SafetyInputs) {
    let yes_no = |b: bool| if b { "yes".green() } else { "no".red() };
    let runtime = &inputs.runtime_config;
    println!(
        "  Runtime:  {:?}{}",
        runtime.profile,
        if runtime.safe_mode.freeze_updates {
            " (updates frozen)".red().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  IRT:      active {} | eligible {}",
        yes_no(inputs.irt_status.active),
        yes_no(inputs.irt_status.eligible)
    );
    let mode = match inputs.rank_status.mode {
        RankingMode::Off => "off",
        RankingMode::Shadow => "shadow",
        RankingMode::Active => "active",
    };
    println!(
        "  Ranking:  {} | eligible {}",
        mode,
        yes_no(inputs.rank_status.eligible)
    );
    println!(
        "  Graph:    available {}{}",
        yes_no(inputs.graph_health.available),
        inputs
            .graph_health
            .detail
            .as_deref()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default()
    );
    println!();
}
