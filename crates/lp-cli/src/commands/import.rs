//! Import command for loading schedule items into the local `SQLite` store.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use lp_core::SchedulableItem;
use lp_db::Database;

/// Reads JSONL items from `reader` and upserts them. Returns the number stored.
pub fn run<R: BufRead, W: Write>(reader: R, writer: &mut W, db: &mut Database) -> Result<usize> {
    let items = parse_items(reader)?;
    let stored = db.upsert_items(&items).context("failed to store items")?;
    writeln!(writer, "Imported {stored} items")?;
    Ok(stored)
}

fn parse_items<R: BufRead>(reader: R) -> Result<Vec<SchedulableItem>> {
    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let item: SchedulableItem = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid item on line {}", idx + 1))?;
        if item.title().trim().is_empty() {
            anyhow::bail!("invalid item on line {}: missing title", idx + 1);
        }
        items.push(item);
    }
    Ok(items)
}
