//! Commands that create tasks and calendar events.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use clap::Args;
use uuid::Uuid;

use lp_core::view::DRAFT_DURATION_MINUTES;
use lp_core::{
    CalendarEvent, EventCategory, ItemId, Priority, Task, TaskSchedule, TaskType, format_instant,
};
use lp_db::Database;

use crate::commands::util::parse_datetime;

#[derive(Debug, Args)]
pub struct AddEventArgs {
    /// Event title.
    #[arg(long)]
    pub title: String,

    /// Start time (e.g., 2024-01-15T09:00).
    #[arg(long)]
    pub start: String,

    /// End time. Defaults to one hour after the start.
    #[arg(long)]
    pub end: Option<String>,

    /// Event category (work, personal, health, social, other).
    #[arg(long)]
    pub category: Option<EventCategory>,

    /// Priority (low, medium, high, urgent).
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Free-form notes.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddTaskArgs {
    /// Task title.
    #[arg(long)]
    pub title: String,

    /// Due time; the task shows on the calendar as a reminder.
    #[arg(long, conflicts_with_all = ["start", "end"], required_unless_present = "start")]
    pub deadline: Option<String>,

    /// Start of the time blocked out for the task.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of the time blocked out for the task.
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Task type (work, personal, health, learning, household, other).
    #[arg(long = "type", value_name = "TYPE")]
    pub task_type: Option<TaskType>,

    /// Priority (low, medium, high, urgent).
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Free-form notes.
    #[arg(long)]
    pub description: Option<String>,
}

fn new_id() -> Result<ItemId> {
    ItemId::new(Uuid::new_v4().to_string()).context("failed to generate item id")
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        anyhow::bail!("title cannot be empty");
    }
    Ok(trimmed.to_string())
}

fn warn_if_inverted(id: &ItemId, start: NaiveDateTime, end: NaiveDateTime) {
    if end <= start {
        tracing::warn!(%id, %start, %end, "item ends before it starts; it will be drawn at minimum height");
    }
}

pub fn run_event<W: Write>(writer: &mut W, db: &mut Database, args: &AddEventArgs) -> Result<ItemId> {
    let title = validate_title(&args.title)?;
    let start = parse_datetime(&args.start)?;
    let end = match &args.end {
        Some(end) => parse_datetime(end)?,
        None => start + Duration::minutes(DRAFT_DURATION_MINUTES),
    };

    let event = CalendarEvent {
        id: new_id()?,
        title,
        description: args.description.clone(),
        start,
        end,
        category: args.category.unwrap_or_default(),
        priority: args.priority.unwrap_or_default(),
    };
    warn_if_inverted(&event.id, event.start, event.end);

    db.upsert_event(&event).context("failed to store event")?;
    writeln!(
        writer,
        "Added event {}: {} ({} - {})",
        event.id,
        event.title,
        format_instant(event.start),
        format_instant(event.end)
    )?;
    Ok(event.id)
}

pub fn run_task<W: Write>(writer: &mut W, db: &mut Database, args: &AddTaskArgs) -> Result<ItemId> {
    let title = validate_title(&args.title)?;
    let schedule = match (&args.deadline, &args.start, &args.end) {
        (Some(deadline), None, None) => TaskSchedule::Deadline {
            deadline: parse_datetime(deadline)?,
        },
        (None, Some(start), Some(end)) => TaskSchedule::TimeRange {
            start_time: parse_datetime(start)?,
            end_time: parse_datetime(end)?,
        },
        _ => anyhow::bail!("give either --deadline or both --start and --end"),
    };

    let task = Task {
        id: new_id()?,
        title,
        description: args.description.clone(),
        task_type: args.task_type.unwrap_or_default(),
        schedule,
        completed: false,
        priority: args.priority.unwrap_or_default(),
        is_reminder: false,
        parent_task_id: None,
    };

    let when = match &task.schedule {
        TaskSchedule::Deadline { deadline } => format!("due {}", format_instant(*deadline)),
        TaskSchedule::TimeRange {
            start_time,
            end_time,
        } => {
            warn_if_inverted(&task.id, *start_time, *end_time);
            format!("{} - {}", format_instant(*start_time), format_instant(*end_time))
        }
    };

    db.upsert_task(&task).context("failed to store task")?;
    writeln!(writer, "Added task {}: {} ({when})", task.id, task.title)?;
    Ok(task.id)
}
