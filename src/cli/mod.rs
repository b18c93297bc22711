pub mod apply;
pub mod approval;
pub mod context;
pub mod init;
pub mod log;
pub mod stage;
pub mod status;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::io::{self, Write};

/// Use the flag value if given, otherwise ask on stdin.
/// EOF yields an empty string, which then fails validation.
pub(crate) fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    print!("  {} {}: ", "→".blue(), label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Parse a `--payload` argument. Absent means `null`.
pub(crate) fn parse_payload(raw: Option<&str>) -> Result<Value> {
    match raw {
        None => Ok(Value::Null),
        Some(s) => serde_json::from_str(s).with_context(|| format!("--payload is not valid JSON: {}", s)),
    }
}
