//! Filesystem locations: config discovery and the state directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Config file name looked up from the working directory upward.
pub const CONFIG_FILE_NAME: &str = ".changegate.yaml";

/// Files inside the state directory.
pub const QUEUE_FILE: &str = "queue.json";
pub const APPROVALS_FILE: &str = "approvals.json";
pub const LOGS_DIR: &str = "logs";

/// Default state directory (~/.changegate/).
pub fn default_state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".changegate"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Find the config file walking up the directory tree from `start`.
pub fn find_config_walking_up(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
