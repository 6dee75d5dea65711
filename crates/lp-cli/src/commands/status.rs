//! Status command for showing what the schedule store holds.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use lp_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.count_items().context("failed to count items")?;

    writeln!(writer, "LifePulse status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    if counts.events == 0 && counts.tasks == 0 {
        writeln!(writer, "No items stored.")?;
        return Ok(());
    }

    writeln!(writer, "Events: {}", counts.events)?;
    writeln!(
        writer,
        "Tasks: {} ({} completed)",
        counts.tasks, counts.completed_tasks
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use lp_core::{CalendarEvent, EventCategory, ItemId, Priority, Task, TaskSchedule, TaskType};

    fn at(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(id: &str, completed: bool) -> Task {
        Task {
            id: ItemId::new(id).unwrap(),
            title: "Read".to_string(),
            description: None,
            task_type: TaskType::Learning,
            schedule: TaskSchedule::TimeRange {
                start_time: at(20),
                end_time: at(21),
            },
            completed,
            priority: Priority::Medium,
            is_reminder: false,
            parent_task_id: None,
        }
    }

    #[test]
    fn status_command_outputs_item_counts() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("lifepulse.db");
        let mut db = Database::open(&db_path).unwrap();

        db.upsert_event(&CalendarEvent {
            id: ItemId::new("e1").unwrap(),
            title: "Dentist".to_string(),
            description: None,
            start: at(9),
            end: at(10),
            category: EventCategory::Health,
            priority: Priority::High,
        })
        .unwrap();
        db.upsert_task(&task("t1", false)).unwrap();
        db.upsert_task(&task("t2", true)).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/lifepulse.db");
        assert_snapshot!(output, @r"
LifePulse status
Database: [TEMP]/lifepulse.db
Events: 1
Tasks: 2 (1 completed)
");
    }

    #[test]
    fn status_command_reports_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("/tmp/lp.db")).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
LifePulse status
Database: /tmp/lp.db
No items stored.
");
    }
}
