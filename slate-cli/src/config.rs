use anyhow::{Context, Result};
use slate_core::PlannerConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_slate_home;

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_slate_home()?.join("config.toml"))
}

pub fn load_config() -> Result<PlannerConfig> {
    load_config_from(&config_path()?)
}

/// Missing file means defaults; missing keys fall back individually.
pub fn load_config_from(p: &Path) -> Result<PlannerConfig> {
    if !p.exists() {
        return Ok(PlannerConfig::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &PlannerConfig) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &PlannerConfig::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    println!("# {}", p.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
