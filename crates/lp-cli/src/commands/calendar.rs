//! Calendar views: load the visible range, lay it out, and render it.
//!
//! Week and day views run the column layout; the month view lists items per date.

use std::io::Write;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Args;
use regex::Regex;
use serde::Serialize;

use lp_core::view::{now_indicator_offset, period_title, step, visible_days};
use lp_core::{
    Direction, HorizontalSpan, PositionedItem, SchedulableItem, ViewMode, layout, with_reminders,
};
use lp_db::Database;

use crate::Config;
use crate::commands::util::parse_date;

/// Leading reminder markers already present in a title.
static REMINDER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[⏰\s]*Reminder:\s*").unwrap());

#[derive(Debug, Args)]
pub struct CalendarArgs {
    /// Any date inside the period to show (YYYY-MM-DD, today, tomorrow, '3 days ago', ...).
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// Show the period before the one containing the date.
    #[arg(long, conflicts_with = "next")]
    pub previous: bool,

    /// Show the period after the one containing the date.
    #[arg(long)]
    pub next: bool,

    /// Output as JSON instead of a text agenda.
    #[arg(long)]
    pub json: bool,
}

impl CalendarArgs {
    const fn direction(&self) -> Option<Direction> {
        if self.previous {
            Some(Direction::Previous)
        } else if self.next {
            Some(Direction::Next)
        } else {
            None
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    mode: ViewMode,
    args: &CalendarArgs,
) -> Result<()> {
    let now = Local::now().naive_local();
    let anchor = match &args.date {
        Some(date) => parse_date(date, now.date())?,
        None => now.date(),
    };
    let anchor = navigate(mode, anchor, args.direction())?;
    render(writer, db, config, mode, anchor, now, args.json)
}

/// Applies the `--previous`/`--next` step, failing at the edges of the calendar.
fn navigate(mode: ViewMode, anchor: NaiveDate, direction: Option<Direction>) -> Result<NaiveDate> {
    let Some(direction) = direction else {
        return Ok(anchor);
    };
    step(mode, anchor, direction).with_context(|| {
        let which = match direction {
            Direction::Previous => "previous",
            Direction::Next => "next",
        };
        format!("no {which} {mode} after {anchor}: date out of range")
    })
}

/// Renders the `mode` view containing `anchor`, with `now` as the current time.
pub fn render<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    mode: ViewMode,
    anchor: NaiveDate,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    let days = visible_days(mode, anchor, config.week_starts_on);
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        anyhow::bail!("no visible days for {mode} view of {anchor}");
    };

    let stored = db
        .list_items_in_range(*first, *last)
        .context("failed to load schedule items")?;
    let items = with_reminders(&stored);
    let title = period_title(mode, anchor, config.week_starts_on);

    if !mode.uses_grid() {
        let entries = agenda_entries(&items, &days);
        tracing::debug!(%mode, %anchor, shown = entries.len(), "rendering month agenda");
        return if json {
            write_month_json(writer, title, &days, &entries)
        } else {
            write_month_agenda(writer, config, &title, &entries)
        };
    }

    let positioned = layout(&items, &days, &config.layout);
    tracing::debug!(%mode, %anchor, shown = positioned.len(), "rendering calendar");

    if json {
        write_json(writer, mode, title, &days, &positioned)
    } else {
        write_agenda(writer, config, &title, &days, &positioned, now)
    }
}

/// The title shown on the grid: reminders get a single "Reminder: " prefix.
pub fn display_title(item: &SchedulableItem) -> String {
    match item.as_task() {
        Some(task) if task.is_reminder => {
            let bare = REMINDER_PREFIX_RE.replace(&task.title, "");
            format!("Reminder: {bare}")
        }
        _ => item.title().to_string(),
    }
}

#[derive(Serialize)]
struct CalendarOutput<'a> {
    view: ViewMode,
    period: String,
    days: &'a [NaiveDate],
    items: Vec<PlacedItem<'a>>,
}

#[derive(Serialize)]
struct PlacedItem<'a> {
    title: String,
    #[serde(flatten)]
    positioned: &'a PositionedItem<'a>,
    left: f64,
    width: f64,
}

fn write_json<W: Write>(
    writer: &mut W,
    mode: ViewMode,
    period: String,
    days: &[NaiveDate],
    positioned: &[PositionedItem<'_>],
) -> Result<()> {
    let items = positioned
        .iter()
        .map(|p| {
            let span = HorizontalSpan::of(p, days.len());
            PlacedItem {
                title: display_title(p.item),
                positioned: p,
                left: span.left,
                width: span.width,
            }
        })
        .collect();
    let output = CalendarOutput {
        view: mode,
        period,
        days,
        items,
    };
    serde_json::to_writer_pretty(&mut *writer, &output).context("failed to encode calendar")?;
    writeln!(writer)?;
    Ok(())
}

fn write_agenda<W: Write>(
    writer: &mut W,
    config: &Config,
    title: &str,
    days: &[NaiveDate],
    positioned: &[PositionedItem<'_>],
    now: NaiveDateTime,
) -> Result<()> {
    writeln!(writer, "{title}")?;

    for (day_index, day) in days.iter().enumerate() {
        writeln!(writer)?;
        writeln!(writer, "{}", day.format("%a %b %-d"))?;

        let mut any = false;
        for p in positioned.iter().filter(|p| p.day_index == day_index) {
            any = true;
            let start = p.item.effective_start();
            let end = p.item.effective_end_with(config.layout.deadline_slot());
            let (column, columns) = column_position(p);
            writeln!(
                writer,
                "  {}-{}  {}  (column {column}/{columns}, top {}, height {})",
                start.format("%H:%M"),
                end.format("%H:%M"),
                display_title(p.item),
                p.top,
                p.height,
            )?;
        }
        if !any {
            writeln!(writer, "  No items.")?;
        }

        if let Some(offset) = now_indicator_offset(now, *day, &config.layout) {
            writeln!(writer, "  -- now {} ({offset:.0}px) --", now.format("%H:%M"))?;
        }
    }

    Ok(())
}

/// Items drawn on each visible date, ordered by start time.
fn agenda_entries<'a>(items: &'a [SchedulableItem], days: &[NaiveDate]) -> Vec<&'a SchedulableItem> {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };
    let mut entries: Vec<_> = items
        .iter()
        .filter(|item| item.is_layout_eligible())
        .filter(|item| (*first..=*last).contains(&item.effective_start().date()))
        .collect();
    entries.sort_by(|a, b| {
        a.effective_start()
            .cmp(&b.effective_start())
            .then_with(|| a.id().as_str().cmp(b.id().as_str()))
    });
    entries
}

#[derive(Serialize)]
struct MonthOutput<'a> {
    view: ViewMode,
    period: String,
    days: &'a [NaiveDate],
    items: Vec<DatedItem<'a>>,
}

#[derive(Serialize)]
struct DatedItem<'a> {
    date: NaiveDate,
    title: String,
    item: &'a SchedulableItem,
}

fn write_month_json<W: Write>(
    writer: &mut W,
    period: String,
    days: &[NaiveDate],
    entries: &[&SchedulableItem],
) -> Result<()> {
    let items = entries
        .iter()
        .map(|&item| DatedItem {
            date: item.effective_start().date(),
            title: display_title(item),
            item,
        })
        .collect();
    let output = MonthOutput {
        view: ViewMode::Month,
        period,
        days,
        items,
    };
    serde_json::to_writer_pretty(&mut *writer, &output).context("failed to encode calendar")?;
    writeln!(writer)?;
    Ok(())
}

/// Prints only the dates that have items.
fn write_month_agenda<W: Write>(
    writer: &mut W,
    config: &Config,
    title: &str,
    entries: &[&SchedulableItem],
) -> Result<()> {
    writeln!(writer, "{title}")?;
    if entries.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "No items.")?;
        return Ok(());
    }

    let mut current = None;
    for item in entries {
        let start = item.effective_start();
        if current != Some(start.date()) {
            current = Some(start.date());
            writeln!(writer)?;
            writeln!(writer, "{}", start.format("%a %b %-d"))?;
        }
        let end = item.effective_end_with(config.layout.deadline_slot());
        writeln!(
            writer,
            "  {}-{}  {}",
            start.format("%H:%M"),
            end.format("%H:%M"),
            display_title(item),
        )?;
    }

    Ok(())
}

/// One-based column and column count of an item within its cluster.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn column_position(positioned: &PositionedItem<'_>) -> (usize, usize) {
    let columns = (1.0 / positioned.width_fraction).round().max(1.0) as usize;
    let column = (positioned.column_fraction * columns as f64).round() as usize + 1;
    (column, columns)
}
