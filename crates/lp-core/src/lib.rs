//! Core domain logic for the LifePulse schedule.
//!
//! This crate contains the fundamental types and logic for:
//! - Items: tasks and calendar events behind one read-only surface
//! - Layout: placing items on the week/day hour grid without collisions
//! - Views: visible day ranges, navigation, and screen mapping

pub mod item;
mod layout;
pub mod types;
pub mod view;

pub use item::{CalendarEvent, SchedulableItem, Task, TaskSchedule, with_reminders};
pub use layout::{
    ColumnSpan, LayoutConfig, PositionedItem, VerticalExtent, assign_columns, layout,
    normalize_clusters, vertical_extent,
};
pub use types::{
    EventCategory, ItemId, Priority, TaskType, ValidationError, format_instant, parse_instant,
};
pub use view::{Direction, HorizontalSpan, ViewMode, WeekStart};
