//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::add::{AddEventArgs, AddTaskArgs};
use crate::commands::calendar::CalendarArgs;
use crate::commands::items::ItemsArgs;

/// LifePulse schedule.
///
/// Keeps tasks and calendar events in a local database and lays them out on
/// a week or day hour grid, placing overlapping items side by side, or lists
/// them per date for a whole month.
#[derive(Debug, Parser)]
#[command(name = "lp", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the week containing a date.
    Week(CalendarArgs),

    /// Show a single day.
    Day(CalendarArgs),

    /// List the items of the month containing a date.
    Month(CalendarArgs),

    /// Add a calendar event.
    AddEvent(AddEventArgs),

    /// Add a task with a deadline or a time range.
    AddTask(AddTaskArgs),

    /// Import items as JSONL from stdin.
    Import,

    /// Print stored items as JSONL.
    Items(ItemsArgs),

    /// Mark a task completed.
    Complete {
        /// Task ID.
        id: String,

        /// Reopen the task instead.
        #[arg(long)]
        undo: bool,
    },

    /// Delete a task or event.
    Delete {
        /// Item ID.
        id: String,
    },

    /// Show database location and item counts.
    Status,
}
