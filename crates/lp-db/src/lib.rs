//! Storage layer for the LifePulse schedule.
//!
//! Provides persistence for tasks and calendar events using `rusqlite`, and
//! hands them back as [`SchedulableItem`]s fetched per visible date range.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Schedule timestamps are wall-clock values stored as TEXT in the fixed-width
//! form `2024-01-15T10:30:00`, so lexicographic ordering matches chronological
//! ordering. Record bookkeeping (`created_at`, `updated_at`) is stored as
//! RFC 3339 UTC.
//!
//! ## Labels
//!
//! Category, type, priority and mode columns hold the lower-case labels from
//! `lp_core` (e.g. `work`, `time_range`).

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use lp_core::{
    CalendarEvent, ItemId, SchedulableItem, Task, TaskSchedule, ValidationError, format_instant,
    parse_instant,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for item {item_id}: {timestamp}")]
    TimestampParse {
        item_id: String,
        timestamp: String,
        #[source]
        source: ValidationError,
    },
    /// A stored row does not describe a valid item.
    #[error("invalid item {item_id}: {message}")]
    InvalidItem { item_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Number of stored items by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub events: usize,
    pub tasks: usize,
    pub completed_tasks: usize,
}

const TASK_MODE_DEADLINE: &str = "deadline";
const TASK_MODE_TIME_RANGE: &str = "time_range";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Calendar events: appointments with an explicit start and end
            CREATE TABLE IF NOT EXISTS schedule_events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                category TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_schedule_events_start ON schedule_events(start_time);

            -- Tasks: mode 'deadline' uses deadline, mode 'time_range' uses start/end
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                type TEXT NOT NULL,
                mode TEXT NOT NULL,
                deadline TEXT,
                start_time TEXT,
                end_time TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                priority TEXT NOT NULL DEFAULT 'medium',
                is_reminder INTEGER NOT NULL DEFAULT 0,
                parent_task_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_start ON tasks(COALESCE(start_time, deadline));
            CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_task_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts or replaces a calendar event, keeping its original `created_at`.
    pub fn upsert_event(&mut self, event: &CalendarEvent) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        upsert_event_in(&tx, event)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts or replaces a task, keeping its original `created_at`.
    pub fn upsert_task(&mut self, task: &Task) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        upsert_task_in(&tx, task)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts or replaces a batch of items in one transaction.
    pub fn upsert_items(&mut self, items: &[SchedulableItem]) -> Result<usize, DbError> {
        if items.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        for item in items {
            match item {
                SchedulableItem::Task(task) => upsert_task_in(&tx, task)?,
                SchedulableItem::Event(event) => upsert_event_in(&tx, event)?,
            }
        }
        tx.commit()?;
        tracing::debug!(count = items.len(), "upserted schedule items");
        Ok(items.len())
    }

    /// Lists every stored item ordered by effective start, then ID.
    pub fn list_items(&self) -> Result<Vec<SchedulableItem>, DbError> {
        self.query_items(None)
    }

    /// Lists items whose effective start falls on a day in `first..=last`.
    ///
    /// Returns an empty list when `last` precedes `first`.
    pub fn list_items_in_range(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<SchedulableItem>, DbError> {
        if last < first {
            return Ok(Vec::new());
        }
        let start = format_instant(first.and_time(NaiveTime::MIN));
        let end = last.succ_opt().map_or_else(
            || UNBOUNDED_END.to_string(),
            |next| format_instant(next.and_time(NaiveTime::MIN)),
        );
        self.query_items(Some((start, end)))
    }

    /// Fetches one item by ID.
    pub fn get_item(&self, id: &str) -> Result<Option<SchedulableItem>, DbError> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM schedule_events WHERE id = ?"),
                [id],
                EventRow::from_row,
            )
            .optional()?;
        if let Some(row) = event {
            return row.into_item().map(Some);
        }
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
                [id],
                TaskRow::from_row,
            )
            .optional()?;
        task.map(TaskRow::into_item).transpose()
    }

    /// Marks a task completed (or open again). Returns false if no task has `id`.
    pub fn set_task_completed(&mut self, id: &str, completed: bool) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET completed = ?, updated_at = ? WHERE id = ?",
            params![completed, now_rfc3339(), id],
        )?;
        Ok(updated > 0)
    }

    /// Deletes an item by ID, along with any reminders generated from it.
    ///
    /// Returns false if nothing had that ID.
    pub fn delete_item(&mut self, id: &str) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;
        let events = tx.execute("DELETE FROM schedule_events WHERE id = ?", [id])?;
        let tasks = tx.execute(
            "DELETE FROM tasks WHERE id = ?1 OR parent_task_id = ?1",
            [id],
        )?;
        tx.commit()?;
        Ok(events + tasks > 0)
    }

    /// Counts stored items.
    pub fn count_items(&self) -> Result<ItemCounts, DbError> {
        let events: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM schedule_events", [], |row| row.get(0))?;
        let (tasks, completed): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ItemCounts {
            events: usize::try_from(events).unwrap_or_default(),
            tasks: usize::try_from(tasks).unwrap_or_default(),
            completed_tasks: usize::try_from(completed).unwrap_or_default(),
        })
    }

    fn query_items(&self, range: Option<(String, String)>) -> Result<Vec<SchedulableItem>, DbError> {
        let (lower, upper) = range.unwrap_or_else(|| (String::new(), UNBOUNDED_END.to_string()));

        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM schedule_events
            WHERE start_time >= ? AND start_time < ?
            "
        ))?;
        let event_rows = stmt.query_map([&lower, &upper], EventRow::from_row)?;
        let mut items = Vec::new();
        for row in event_rows {
            items.push(row?.into_item()?);
        }

        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE COALESCE(start_time, deadline) >= ? AND COALESCE(start_time, deadline) < ?
            "
        ))?;
        let task_rows = stmt.query_map([&lower, &upper], TaskRow::from_row)?;
        for row in task_rows {
            items.push(row?.into_item()?);
        }

        items.sort_by(|a, b| {
            a.effective_start()
                .cmp(&b.effective_start())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(items)
    }
}

/// Sorts after every stored timestamp.
const UNBOUNDED_END: &str = "~";

const EVENT_COLUMNS: &str = "id, title, description, start_time, end_time, category, priority";

const TASK_COLUMNS: &str = "id, title, description, type, mode, deadline, start_time, end_time, \
                            completed, priority, is_reminder, parent_task_id";

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ids are shared between events and tasks: storing one kind replaces the other.
fn upsert_event_in(tx: &Transaction<'_>, event: &CalendarEvent) -> Result<(), DbError> {
    let replaced = tx.execute("DELETE FROM tasks WHERE id = ?1", [event.id.as_str()])?;
    if replaced > 0 {
        tracing::debug!(id = event.id.as_str(), "event replaces stored task");
    }
    let now = now_rfc3339();
    tx.execute(
        "
        INSERT INTO schedule_events
        (id, title, description, start_time, end_time, category, priority, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            category = excluded.category,
            priority = excluded.priority,
            updated_at = excluded.updated_at
        ",
        params![
            event.id.as_str(),
            event.title,
            event.description,
            format_instant(event.start),
            format_instant(event.end),
            event.category.as_str(),
            event.priority.as_str(),
            now,
        ],
    )?;
    Ok(())
}

fn upsert_task_in(tx: &Transaction<'_>, task: &Task) -> Result<(), DbError> {
    let (mode, deadline, start_time, end_time) = match &task.schedule {
        TaskSchedule::Deadline { deadline } => {
            (TASK_MODE_DEADLINE, Some(format_instant(*deadline)), None, None)
        }
        TaskSchedule::TimeRange {
            start_time,
            end_time,
        } => (
            TASK_MODE_TIME_RANGE,
            None,
            Some(format_instant(*start_time)),
            Some(format_instant(*end_time)),
        ),
    };
    let replaced = tx.execute("DELETE FROM schedule_events WHERE id = ?1", [task.id.as_str()])?;
    if replaced > 0 {
        tracing::debug!(id = task.id.as_str(), "task replaces stored event");
    }
    let now = now_rfc3339();
    tx.execute(
        "
        INSERT INTO tasks
        (id, title, description, type, mode, deadline, start_time, end_time,
         completed, priority, is_reminder, parent_task_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            type = excluded.type,
            mode = excluded.mode,
            deadline = excluded.deadline,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            completed = excluded.completed,
            priority = excluded.priority,
            is_reminder = excluded.is_reminder,
            parent_task_id = excluded.parent_task_id,
            updated_at = excluded.updated_at
        ",
        params![
            task.id.as_str(),
            task.title,
            task.description,
            task.task_type.as_str(),
            mode,
            deadline,
            start_time,
            end_time,
            task.completed,
            task.priority.as_str(),
            task.is_reminder,
            task.parent_task_id.as_ref().map(ItemId::as_str),
            now,
        ],
    )?;
    Ok(())
}

/// A `schedule_events` row as stored.
struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    start_time: String,
    end_time: String,
    category: String,
    priority: String,
}

impl EventRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            category: row.get(5)?,
            priority: row.get(6)?,
        })
    }

    fn into_item(self) -> Result<SchedulableItem, DbError> {
        let start = parse_stored(&self.id, &self.start_time)?;
        let end = parse_stored(&self.id, &self.end_time)?;
        Ok(SchedulableItem::Event(CalendarEvent {
            id: parse_id(&self.id)?,
            category: parse_label(&self.id, &self.category)?,
            priority: parse_label(&self.id, &self.priority)?,
            title: self.title,
            description: self.description,
            start,
            end,
        }))
    }
}

/// A `tasks` row as stored.
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    task_type: String,
    mode: String,
    deadline: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    completed: bool,
    priority: String,
    is_reminder: bool,
    parent_task_id: Option<String>,
}

impl TaskRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            task_type: row.get(3)?,
            mode: row.get(4)?,
            deadline: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            completed: row.get(8)?,
            priority: row.get(9)?,
            is_reminder: row.get(10)?,
            parent_task_id: row.get(11)?,
        })
    }

    fn into_item(self) -> Result<SchedulableItem, DbError> {
        let schedule = match (
            self.mode.as_str(),
            &self.deadline,
            &self.start_time,
            &self.end_time,
        ) {
            (TASK_MODE_DEADLINE, Some(deadline), _, _) => TaskSchedule::Deadline {
                deadline: parse_stored(&self.id, deadline)?,
            },
            (TASK_MODE_TIME_RANGE, _, Some(start), Some(end)) => TaskSchedule::TimeRange {
                start_time: parse_stored(&self.id, start)?,
                end_time: parse_stored(&self.id, end)?,
            },
            (mode, ..) => {
                return Err(DbError::InvalidItem {
                    item_id: self.id.clone(),
                    message: format!("mode {mode} is missing its timestamps"),
                });
            }
        };
        let parent_task_id = self.parent_task_id.as_deref().map(parse_id).transpose()?;
        Ok(SchedulableItem::Task(Task {
            id: parse_id(&self.id)?,
            task_type: parse_label(&self.id, &self.task_type)?,
            priority: parse_label(&self.id, &self.priority)?,
            title: self.title,
            description: self.description,
            schedule,
            completed: self.completed,
            is_reminder: self.is_reminder,
            parent_task_id,
        }))
    }
}

fn parse_stored(item_id: &str, timestamp: &str) -> Result<NaiveDateTime, DbError> {
    parse_instant(timestamp).map_err(|source| DbError::TimestampParse {
        item_id: item_id.to_string(),
        timestamp: timestamp.to_string(),
        source,
    })
}

fn parse_id(id: &str) -> Result<ItemId, DbError> {
    ItemId::new(id).map_err(|e| DbError::InvalidItem {
        item_id: id.to_string(),
        message: e.to_string(),
    })
}

fn parse_label<T>(item_id: &str, value: &str) -> Result<T, DbError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    value.parse().map_err(|e: ValidationError| DbError::InvalidItem {
        item_id: item_id.to_string(),
        message: e.to_string(),
    })
}
