//! Schedulable items: tasks and calendar events.
//!
//! Both kinds share one read-only surface ([`SchedulableItem::effective_start`],
//! [`SchedulableItem::effective_end`], [`SchedulableItem::title`]) so the layout
//! engine never has to inspect which kind it holds.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{EventCategory, ItemId, Priority, TaskType, instant};

/// Length of the synthetic slot a deadline task occupies on the calendar.
pub const DEFAULT_DEADLINE_SLOT_MINUTES: u32 = 15;

/// When a task happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TaskSchedule {
    /// Due at a single instant.
    Deadline {
        #[serde(with = "instant")]
        deadline: NaiveDateTime,
    },
    /// Blocked out between two instants.
    TimeRange {
        #[serde(with = "instant")]
        start_time: NaiveDateTime,
        #[serde(with = "instant")]
        end_time: NaiveDateTime,
    },
}

/// A to-do item, either due at a deadline or blocked out over a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(flatten)]
    pub schedule: TaskSchedule,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Set on the generated calendar stand-in for a deadline task.
    #[serde(default)]
    pub is_reminder: bool,
    /// For reminders, the task this reminder was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<ItemId>,
}

impl Task {
    /// Returns true for deadline-mode tasks.
    pub const fn is_deadline(&self) -> bool {
        matches!(self.schedule, TaskSchedule::Deadline { .. })
    }

    /// Builds the reminder that stands in for this task on the calendar.
    ///
    /// Only open deadline tasks that are not reminders themselves have one.
    pub fn reminder(&self) -> Option<Self> {
        if !self.is_deadline() || self.is_reminder || self.completed {
            return None;
        }
        Some(Self {
            id: self.id.derived("reminder"),
            is_reminder: true,
            parent_task_id: Some(self.id.clone()),
            ..self.clone()
        })
    }
}

/// An appointment on the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "instant")]
    pub start: NaiveDateTime,
    #[serde(with = "instant")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub priority: Priority,
}

/// Anything that can be placed on the week or day grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulableItem {
    Task(Task),
    Event(CalendarEvent),
}

impl SchedulableItem {
    pub const fn id(&self) -> &ItemId {
        match self {
            Self::Task(task) => &task.id,
            Self::Event(event) => &event.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Task(task) => &task.title,
            Self::Event(event) => &event.title,
        }
    }

    /// Resolved start: the deadline, the range start, or the event start.
    pub const fn effective_start(&self) -> NaiveDateTime {
        match self {
            Self::Task(Task {
                schedule: TaskSchedule::Deadline { deadline },
                ..
            }) => *deadline,
            Self::Task(Task {
                schedule: TaskSchedule::TimeRange { start_time, .. },
                ..
            }) => *start_time,
            Self::Event(event) => event.start,
        }
    }

    /// Resolved end, with deadlines occupying the default 15-minute slot.
    pub fn effective_end(&self) -> NaiveDateTime {
        self.effective_end_with(Duration::minutes(i64::from(
            DEFAULT_DEADLINE_SLOT_MINUTES,
        )))
    }

    /// Resolved end, with deadlines occupying a slot of `deadline_slot`.
    pub fn effective_end_with(&self, deadline_slot: Duration) -> NaiveDateTime {
        match self {
            Self::Task(Task {
                schedule: TaskSchedule::Deadline { deadline },
                ..
            }) => *deadline + deadline_slot,
            Self::Task(Task {
                schedule: TaskSchedule::TimeRange { end_time, .. },
                ..
            }) => *end_time,
            Self::Event(event) => event.end,
        }
    }

    /// Whether the calendar shows this item at all.
    ///
    /// Completed tasks are hidden, and deadline tasks are represented by their
    /// reminder rather than themselves.
    pub const fn is_layout_eligible(&self) -> bool {
        match self {
            Self::Task(task) => !task.completed && (!task.is_deadline() || task.is_reminder),
            Self::Event(_) => true,
        }
    }

    pub const fn as_task(&self) -> Option<&Task> {
        match self {
            Self::Task(task) => Some(task),
            Self::Event(_) => None,
        }
    }
}

impl From<Task> for SchedulableItem {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<CalendarEvent> for SchedulableItem {
    fn from(event: CalendarEvent) -> Self {
        Self::Event(event)
    }
}

/// Returns `items` followed by a reminder for every deadline task lacking one.
///
/// A task counts as covered when some reminder in `items` names it as parent.
pub fn with_reminders(items: &[SchedulableItem]) -> Vec<SchedulableItem> {
    let covered: Vec<&ItemId> = items
        .iter()
        .filter_map(SchedulableItem::as_task)
        .filter(|task| task.is_reminder)
        .filter_map(|task| task.parent_task_id.as_ref())
        .collect();

    let reminders: Vec<SchedulableItem> = items
        .iter()
        .filter_map(SchedulableItem::as_task)
        .filter(|task| !covered.contains(&&task.id))
        .filter_map(Task::reminder)
        .map(SchedulableItem::Task)
        .collect();

    if !reminders.is_empty() {
        tracing::debug!(count = reminders.len(), "generated deadline reminders");
    }

    items.iter().cloned().chain(reminders).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    pub fn event(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> SchedulableItem {
        SchedulableItem::Event(CalendarEvent {
            id: ItemId::new(id).unwrap(),
            title: format!("Event {id}"),
            description: None,
            start,
            end,
            category: EventCategory::Work,
            priority: Priority::Medium,
        })
    }

    pub fn task(id: &str, schedule: TaskSchedule) -> Task {
        Task {
            id: ItemId::new(id).unwrap(),
            title: format!("Task {id}"),
            description: None,
            task_type: TaskType::Personal,
            schedule,
            completed: false,
            priority: Priority::High,
            is_reminder: false,
            parent_task_id: None,
        }
    }

    pub fn range_task(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> SchedulableItem {
        SchedulableItem::Task(task(
            id,
            TaskSchedule::TimeRange {
                start_time: start,
                end_time: end,
            },
        ))
    }

    pub fn deadline_task(id: &str, deadline: NaiveDateTime) -> Task {
        task(id, TaskSchedule::Deadline { deadline })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn effective_bounds_for_each_kind() {
        let evt = event("e", at(1, 9, 0), at(1, 10, 0));
        assert_eq!(evt.effective_start(), at(1, 9, 0));
        assert_eq!(evt.effective_end(), at(1, 10, 0));

        let ranged = range_task("r", at(1, 13, 0), at(1, 14, 30));
        assert_eq!(ranged.effective_start(), at(1, 13, 0));
        assert_eq!(ranged.effective_end(), at(1, 14, 30));

        let due = SchedulableItem::Task(deadline_task("d", at(1, 14, 0)));
        assert_eq!(due.effective_start(), at(1, 14, 0));
        assert_eq!(due.effective_end(), at(1, 14, 15));
        assert_eq!(due.effective_end_with(Duration::minutes(30)), at(1, 14, 30));
    }

    #[test]
    fn eligibility_hides_completed_and_raw_deadlines() {
        assert!(event("e", at(1, 9, 0), at(1, 10, 0)).is_layout_eligible());
        assert!(range_task("r", at(1, 9, 0), at(1, 10, 0)).is_layout_eligible());

        let mut done = deadline_task("done", at(1, 9, 0));
        done.schedule = TaskSchedule::TimeRange {
            start_time: at(1, 9, 0),
            end_time: at(1, 10, 0),
        };
        done.completed = true;
        assert!(!SchedulableItem::Task(done).is_layout_eligible());

        let raw = deadline_task("d", at(1, 9, 0));
        assert!(!SchedulableItem::Task(raw.clone()).is_layout_eligible());
        let reminder = raw.reminder().unwrap();
        assert!(SchedulableItem::Task(reminder).is_layout_eligible());
    }

    #[test]
    fn reminder_links_back_to_parent() {
        let raw = deadline_task("task-1", at(1, 14, 0));
        let reminder = raw.reminder().unwrap();
        assert_eq!(reminder.id.as_str(), "task-1-reminder");
        assert_eq!(reminder.parent_task_id.as_ref(), Some(&raw.id));
        assert!(reminder.is_reminder);
        assert_eq!(reminder.title, raw.title);
        assert_eq!(reminder.schedule, raw.schedule);
        assert!(reminder.reminder().is_none());
    }

    #[test]
    fn no_reminder_for_ranges_or_completed_tasks() {
        let ranged = task(
            "r",
            TaskSchedule::TimeRange {
                start_time: at(1, 9, 0),
                end_time: at(1, 10, 0),
            },
        );
        assert!(ranged.reminder().is_none());

        let mut done = deadline_task("d", at(1, 9, 0));
        done.completed = true;
        assert!(done.reminder().is_none());
    }

    #[test]
    fn with_reminders_appends_missing_counterparts_only() {
        let first = deadline_task("a", at(1, 9, 0));
        let second = deadline_task("b", at(1, 11, 0));
        let existing = second.reminder().unwrap();
        let items = vec![
            SchedulableItem::Task(first),
            SchedulableItem::Task(second),
            SchedulableItem::Task(existing),
            event("e", at(1, 12, 0), at(1, 13, 0)),
        ];

        let expanded = with_reminders(&items);
        let ids: Vec<&str> = expanded.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, ["a", "b", "b-reminder", "e", "a-reminder"]);
    }

    #[test]
    fn task_json_uses_mode_tag() {
        let json = r#"{
            "kind": "task",
            "id": "t-1",
            "title": "Dentist",
            "type": "HEALTH",
            "mode": "time_range",
            "start_time": "2024-01-02T09:00:00",
            "end_time": "2024-01-02T09:45"
        }"#;
        let item: SchedulableItem = serde_json::from_str(json).unwrap();
        let SchedulableItem::Task(task) = &item else {
            panic!("expected a task, got {item:?}");
        };
        assert_eq!(task.task_type, TaskType::Health);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert_eq!(item.effective_end(), at(2, 9, 45));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["mode"], "time_range");
        assert_eq!(back["end_time"], "2024-01-02T09:45:00");
    }

    #[test]
    fn reminder_serializes_flat() {
        let reminder = deadline_task("task-1", at(1, 14, 0)).reminder().unwrap();
        let json = serde_json::to_string_pretty(&SchedulableItem::Task(reminder)).unwrap();
        insta::assert_snapshot!(json, @r#"
{
  "kind": "task",
  "id": "task-1-reminder",
  "title": "Task task-1",
  "type": "personal",
  "mode": "deadline",
  "deadline": "2024-01-01T14:00:00",
  "completed": false,
  "priority": "high",
  "is_reminder": true,
  "parent_task_id": "task-1"
}
"#);
    }

    #[test]
    fn event_json_rejects_bad_timestamp() {
        let json = r#"{
            "kind": "event",
            "id": "e-1",
            "title": "Standup",
            "start": "yesterday-ish",
            "end": "2024-01-02T09:45:00"
        }"#;
        let result: Result<SchedulableItem, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn deadline_json_requires_deadline() {
        let json = r#"{"kind": "task", "id": "t", "title": "x", "mode": "deadline"}"#;
        let result: Result<SchedulableItem, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
