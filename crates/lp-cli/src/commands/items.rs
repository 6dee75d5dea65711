//! Items command for dumping stored items as JSONL.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;

use lp_db::Database;

use crate::commands::util::parse_date;

#[derive(Debug, Args)]
pub struct ItemsArgs {
    /// Only items starting on or after this date.
    #[arg(long)]
    pub after: Option<String>,

    /// Only items starting before this date.
    #[arg(long)]
    pub before: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &ItemsArgs) -> Result<usize> {
    let today = Local::now().date_naive();
    let after = args
        .after
        .as_deref()
        .map(|s| parse_date(s, today))
        .transpose()?;
    let before = args
        .before
        .as_deref()
        .map(|s| parse_date(s, today))
        .transpose()?;
    write_items(writer, db, after, before)
}

fn write_items<W: Write>(
    writer: &mut W,
    db: &Database,
    after: Option<NaiveDate>,
    before: Option<NaiveDate>,
) -> Result<usize> {
    let items = match (after, before) {
        (None, None) => db.list_items()?,
        (after, before) => {
            let Some(last) = before.map_or(Some(NaiveDate::MAX), |d| d.pred_opt()) else {
                return Ok(0);
            };
            db.list_items_in_range(after.unwrap_or(NaiveDate::MIN), last)?
        }
    };

    for item in &items {
        let line = serde_json::to_string(item).context("failed to encode item")?;
        writeln!(writer, "{line}")?;
    }
    Ok(items.len())
}
