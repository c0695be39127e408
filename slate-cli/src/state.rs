use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slate_core::{BacklogTask, ScheduleSnapshot, UserPreferences};
use std::fs;
use std::path::{Path, PathBuf};

/// `$SLATE_HOME`, or `~/.slate`.
pub fn slate_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SLATE_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".slate"))
}

pub fn ensure_slate_home() -> Result<PathBuf> {
    let dir = slate_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Everything one planner invocation works from, as exported by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerInput {
    #[serde(default)]
    pub preferences: Option<UserPreferences>,

    #[serde(default)]
    pub schedule: ScheduleSnapshot,

    /// Unscheduled tasks in priority order.
    #[serde(default)]
    pub backlog: Vec<BacklogTask>,
}

pub fn read_input(path: &Path) -> Result<PlannerInput> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}
