//! Commands that change or remove stored items by ID.

use std::io::Write;

use anyhow::{Context, Result};

use lp_db::Database;

/// Marks a task completed, or open again with `undo`.
pub fn complete<W: Write>(writer: &mut W, db: &mut Database, id: &str, undo: bool) -> Result<()> {
    let found = db
        .set_task_completed(id, !undo)
        .with_context(|| format!("failed to update task {id}"))?;
    if !found {
        anyhow::bail!("no task with id {id}");
    }
    if undo {
        writeln!(writer, "Reopened task {id}")?;
    } else {
        writeln!(writer, "Completed task {id}")?;
    }
    Ok(())
}

/// Deletes a task or event, along with any stored reminders for it.
pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    let found = db
        .delete_item(id)
        .with_context(|| format!("failed to delete item {id}"))?;
    if !found {
        anyhow::bail!("no item with id {id}");
    }
    writeln!(writer, "Deleted {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use lp_core::{ItemId, Priority, Task, TaskSchedule, TaskType};

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_task(&Task {
            id: ItemId::new("t1").unwrap(),
            title: "Water plants".to_string(),
            description: None,
            task_type: TaskType::Household,
            schedule: TaskSchedule::Deadline {
                deadline: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(18, 0, 0)
                    .unwrap(),
            },
            completed: false,
            priority: Priority::Low,
            is_reminder: false,
            parent_task_id: None,
        })
        .unwrap();
        db
    }

    #[test]
    fn complete_then_undo() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        complete(&mut out, &mut db, "t1", false).unwrap();
        assert_eq!(db.count_items().unwrap().completed_tasks, 1);

        complete(&mut out, &mut db, "t1", true).unwrap();
        assert_eq!(db.count_items().unwrap().completed_tasks, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Completed task t1\nReopened task t1\n"
        );
    }

    #[test]
    fn complete_unknown_task_fails() {
        let mut db = seeded_db();
        let err = complete(&mut Vec::new(), &mut db, "nope", false).unwrap_err();
        assert_eq!(err.to_string(), "no task with id nope");
    }

    #[test]
    fn delete_removes_item() {
        let mut db = seeded_db();
        let mut out = Vec::new();
        delete(&mut out, &mut db, "t1").unwrap();
        assert_eq!(db.count_items().unwrap().tasks, 0);
        assert!(delete(&mut out, &mut db, "t1").is_err());
    }
}
