//! slate-core: constraint-aware task placement for the Slate planner

pub mod busy;
pub mod config;
pub mod drag;
pub mod error;
pub mod interval;
pub mod preferences;
pub mod scheduler;
pub mod task;
pub mod time;
pub mod validator;

pub use busy::BusyIntervalBuilder;
pub use config::{PlannerConfig, ValidatorOptions};
pub use drag::{
    AcceptedPlacement, DragOutcome, DragRescheduler, offset_from_pixels, validate_drop_target,
    validate_task_for_drag,
};
pub use error::{ConstraintViolation, ScheduleError, ScheduleResult, TaskDefect, TimeError};
pub use interval::{Interval, IntervalSet, Probe, Severity, SourceKind, SourceRef, SourceTag, merge};
pub use preferences::UserPreferences;
pub use scheduler::{AutoScheduler, ScheduleOutcome};
pub use task::{BacklogTask, CalendarTask, Placement, ScheduleSnapshot, TimeBlock};
pub use time::{ClockTime, GridPosition, grid_position};
pub use validator::{CandidateSlot, Conflict, ConflictReport, ConflictValidator, Warning};
