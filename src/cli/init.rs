//! `changegate init` — write a starter `.changegate.yaml`.
//!
//! The starter config wires every action to an `echo` executor so the whole
//! flow can be tried end to end before pointing it at real admin endpoints.

use crate::cli::context::absolute;
use crate::registry::defaults::DEFAULT_CONFIG_YAML;
use crate::utils::paths::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Run the `changegate init` command. Returns the path written, or `None`
/// when a config already exists and `force` is off.
pub fn run_init(output: Option<&Path>, force: bool) -> Result<Option<PathBuf>> {
    let output_file = match output {
        Some(p) => absolute(p),
        None => std::env::current_dir()
            .context("Failed to get current directory")?
            .join(CONFIG_FILE_NAME),
    };

    if output_file.exists() && !force {
        println!(
            "{} A config file already exists at {}",
            "⚠".yellow(),
            output_file.display()
        );
        println!("  Use --force to overwrite it, or edit it directly.");
        return Ok(None);
    }

    std::fs::write(&output_file, DEFAULT_CONFIG_YAML)
        .with_context(|| format!("Failed to write config file: {}", output_file.display()))?;

    println!();
    println!(
        "  {} Created {}",
        "✓".green().bold(),
        output_file.display().to_string().bold()
    );
    println!();
    println!("  {} Next steps:", "→".blue());
    println!(
        "    1. Point each executor at your admin API: {}",
        format!("$EDITOR {}", output_file.display()).dimmed()
    );
    println!("    2. Validate it: {}", "changegate check".dimmed());
    println!(
        "    3. Stage a change: {}",
        "changegate stage run_graph_sync".dimmed()
    );
    println!();

    Ok(Some(output_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_config_file;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_parseable_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);

        let written = run_init(Some(path.as_path()), false).unwrap();
        assert_eq!(written.as_deref(), Some(path.as_path()));
        assert!(parse_config_file(&path).is_ok());
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "registry: mine\n").unwrap();

        assert!(run_init(Some(path.as_path()), false).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "registry: mine\n");

        assert!(run_init(Some(path.as_path()), true).unwrap().is_some());
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "registry: mine\n");
    }
}
