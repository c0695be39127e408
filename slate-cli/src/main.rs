use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slate_core::time::{at_minute, parse_clock};
use slate_core::{
    AutoScheduler, ConflictValidator, DragOutcome, DragRescheduler, PlannerConfig, ScheduleError,
    offset_from_pixels, validate_drop_target,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod state;

const DEFAULT_LOG_DIRECTIVES: &str = "slate_core=info,slate=info";

#[derive(Parser, Debug)]
#[command(
    name = "slate",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLATE_BUILD_SHA"), ")"),
    about = "Slate planner: auto-schedule and reschedule tasks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place the backlog into free time, starting today
    Auto {
        /// Planner snapshot (preferences, schedule, backlog) as JSON
        #[arg(long)]
        input: PathBuf,

        /// First day to fill (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Horizon in weeks (default: from config)
        #[arg(long)]
        weeks: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Check a single time slot for conflicts
    Check {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        date: NaiveDate,

        /// Start time, HH:MM
        #[arg(long)]
        start: String,

        /// End time, HH:MM
        #[arg(long)]
        end: String,

        /// Task id to ignore (the task being moved)
        #[arg(long)]
        exclude: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Move a scheduled task by a pointer offset onto a target day
    Drag {
        #[arg(long)]
        input: PathBuf,

        /// Id of the task being dragged
        #[arg(long)]
        task: String,

        /// Drop target id (a YYYY-MM-DD day column)
        #[arg(long)]
        target: String,

        /// Offset in minutes
        #[arg(
            long,
            allow_hyphen_values = true,
            conflicts_with = "delta_pixels",
            required_unless_present = "delta_pixels"
        )]
        delta_minutes: Option<f64>,

        /// Vertical pointer travel in pixels
        #[arg(long, allow_hyphen_values = true)]
        delta_pixels: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// List free slots on a day, or the ones nearest a preferred start
    Slots {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        date: NaiveDate,

        /// Task length in minutes
        #[arg(long)]
        duration: u32,

        /// Preferred start, HH:MM
        #[arg(long)]
        near: Option<String>,

        #[arg(long, default_value_t = 5)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.slate/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Auto {
            input,
            from,
            weeks,
            json,
        } => {
            let cfg = config::load_config()?;
            let planner = state::read_input(&input)?;
            let first_day = from.unwrap_or_else(|| Local::now().date_naive());
            let scheduler = match weeks {
                Some(w) => AutoScheduler::new(w),
                None => AutoScheduler::from_config(&cfg),
            };

            let outcome = scheduler.run(
                planner.backlog,
                planner.preferences.as_ref(),
                &planner.schedule,
                first_day,
            )?;
            emit(&outcome, json, render::render_outcome)?;
        }

        Command::Check {
            input,
            date,
            start,
            end,
            exclude,
            json,
        } => {
            let cfg = config::load_config()?;
            let planner = state::read_input(&input)?;
            let prefs = planner
                .preferences
                .as_ref()
                .ok_or(ScheduleError::MissingPreferences)?;
            let validator = ConflictValidator::new(prefs, &planner.schedule, cfg.validator.clone());

            let s = clock_arg("--start", &start)?;
            let e = clock_arg("--end", &end)?;
            let report = validator.validate_on(date, s, e, exclude.as_deref(), now());
            emit(&report, json, render::render_report)?;
        }

        Command::Drag {
            input,
            task,
            target,
            delta_minutes,
            delta_pixels,
            json,
        } => {
            let cfg = config::load_config()?;
            let planner = state::read_input(&input)?;
            let outcome = drag(&cfg, &planner, &task, &target, delta_minutes, delta_pixels)?;
            emit(&outcome, json, render::render_drag)?;
        }

        Command::Slots {
            input,
            date,
            duration,
            near,
            limit,
            json,
        } => {
            let cfg = config::load_config()?;
            let planner = state::read_input(&input)?;
            let prefs = planner
                .preferences
                .as_ref()
                .ok_or(ScheduleError::MissingPreferences)?;
            let validator = ConflictValidator::new(prefs, &planner.schedule, cfg.validator.clone());

            let slots = match near {
                Some(near) => {
                    let preferred = at_minute(date, clock_arg("--near", &near)?);
                    validator.suggest_alternatives(preferred, duration, None, limit, now())
                }
                None => {
                    let mut all = validator.available_slots(date, duration, None, now());
                    all.truncate(limit);
                    all
                }
            };
            emit(&slots, json, |s| render::render_slots(s))?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn clock_arg(flag: &str, raw: &str) -> Result<u32> {
    parse_clock(raw).with_context(|| format!("{flag} expects HH:MM, got '{raw}'"))
}

fn drag(
    cfg: &PlannerConfig,
    planner: &state::PlannerInput,
    task_id: &str,
    target: &str,
    delta_minutes: Option<f64>,
    delta_pixels: Option<f64>,
) -> Result<DragOutcome> {
    let task = planner
        .schedule
        .find_task(task_id)
        .with_context(|| format!("task '{task_id}' is not in the schedule"))?;

    let offset = match (delta_minutes, delta_pixels) {
        (Some(m), _) => m,
        (None, Some(px)) => offset_from_pixels(px, cfg.hour_height_px),
        (None, None) => bail!("pass --delta-minutes or --delta-pixels"),
    };

    let now = now();
    let target_date = validate_drop_target(Some(target), now.date(), cfg)?;
    let rescheduler = DragRescheduler::new(planner.preferences.as_ref(), &planner.schedule, cfg)?;
    let outcome = rescheduler.reschedule(task, offset, target_date, now)?;
    info!(task_id, accepted = outcome.is_accepted(), "drag evaluated");
    Ok(outcome)
}

/// Print `value` as pretty JSON or through `render`.
fn emit<T: Serialize>(value: &T, json: bool, render: impl Fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    } else {
        print!("{}", render(value));
    }
    Ok(())
}
