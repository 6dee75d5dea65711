//! Calendar layout engine.
//!
//! Places schedulable items on a day-column hour grid so that items which
//! overlap in time sit side by side instead of on top of each other.
//!
//! # Algorithm Summary
//!
//! For each visible day independently:
//!
//! 1. Keep the eligible items starting on that day, stable-sorted by start.
//! 2. Compute each item's vertical extent in pixels ([`vertical_extent`]).
//! 3. Pack items greedily into columns ([`assign_columns`]): an item takes the
//!    lowest-indexed column whose last item has ended, else opens a new one.
//! 4. Group items whose pixel extents touch into clusters and give every
//!    cluster the full day width, split evenly between the columns it actually
//!    uses ([`normalize_clusters`]).
//!
//! The engine is a pure function of its inputs: identical inputs always give
//! identical output, and nothing is cached between calls.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::item::{DEFAULT_DEADLINE_SLOT_MINUTES, SchedulableItem};

/// Configuration for calendar layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pixel height of one hour row.
    /// Default: 60.
    pub hour_height: u32,

    /// Length of the synthetic slot given to deadline tasks.
    /// Default: 15 minutes.
    pub deadline_slot_minutes: u32,

    /// Smallest height an item is ever drawn with.
    /// Default: 2 pixels.
    pub min_height: i32,

    /// Stacking order of column 0; column `n` sits at `base_z_index + n`.
    /// Default: 10.
    pub base_z_index: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hour_height: 60,
            deadline_slot_minutes: DEFAULT_DEADLINE_SLOT_MINUTES,
            min_height: 2,
            base_z_index: 10,
        }
    }
}

impl LayoutConfig {
    pub fn deadline_slot(&self) -> Duration {
        Duration::minutes(i64::from(self.deadline_slot_minutes))
    }

    /// Pixel offset of a minute-of-day on the grid, rounded to whole pixels.
    #[allow(clippy::cast_possible_truncation)]
    pub fn minute_to_pixels(&self, minute: u32) -> i32 {
        (f64::from(minute) / 60.0 * f64::from(self.hour_height)).round() as i32
    }
}

/// Where an item sits vertically within its day column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalExtent {
    /// Minutes since midnight of the start instant.
    pub start_minute: u32,
    /// Minutes since midnight of the end instant.
    pub end_minute: u32,
    pub top: i32,
    pub height: i32,
}

impl VerticalExtent {
    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Half-open pixel interval intersection.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.top < other.bottom() && other.top < self.bottom()
    }
}

/// Horizontal placement of an item within its day column, as fractions of
/// the column width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSpan {
    pub column_fraction: f64,
    pub width_fraction: f64,
}

impl ColumnSpan {
    pub const FULL: Self = Self {
        column_fraction: 0.0,
        width_fraction: 1.0,
    };
}

/// An item with its computed position on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedItem<'a> {
    pub item: &'a SchedulableItem,
    /// Offset of the item's day within the visible days.
    pub day_index: usize,
    pub top: i32,
    pub height: i32,
    /// Left edge within the day column, in `[0, 1)`.
    pub column_fraction: f64,
    /// Width within the day column, in `(0, 1]`.
    pub width_fraction: f64,
    pub z_index: i32,
}

fn minutes_since_midnight(instant: NaiveDateTime) -> u32 {
    instant.hour() * 60 + instant.minute()
}

/// Computes the pixel extent of an item spanning `start..end`.
///
/// Items starting on the hour are pushed down one pixel off the grid line.
/// Items ending on the hour lose their last pixel, unless the start nudge
/// already took one. Neither trim applies if it would leave the item shorter
/// than `min_height`, and the final height is never below `min_height`, which
/// also covers zero-length and inverted ranges.
pub fn vertical_extent(
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &LayoutConfig,
) -> VerticalExtent {
    let start_minute = minutes_since_midnight(start);
    let end_minute = minutes_since_midnight(end);

    let mut top = config.minute_to_pixels(start_minute);
    let mut height = config.minute_to_pixels(end_minute) - top;

    let mut trimmed = false;
    if start_minute % 60 == 0 && height - 1 >= config.min_height {
        top += 1;
        height -= 1;
        trimmed = true;
    }
    if end_minute % 60 == 0 && !trimmed && height - 1 >= config.min_height {
        height -= 1;
    }

    VerticalExtent {
        start_minute,
        end_minute,
        top,
        height: height.max(config.min_height),
    }
}

/// Greedy column packing over extents sorted by start.
///
/// Returns the raw column index for each extent. Each column remembers the
/// latest end minute placed in it; an extent goes into the lowest-indexed
/// column that has ended by its start minute.
pub fn assign_columns(extents: &[VerticalExtent]) -> Vec<usize> {
    let mut column_ends: Vec<u32> = Vec::new();
    extents
        .iter()
        .map(|extent| {
            match column_ends
                .iter()
                .position(|&end| end <= extent.start_minute)
            {
                Some(column) => {
                    column_ends[column] = column_ends[column].max(extent.end_minute);
                    column
                }
                None => {
                    column_ends.push(extent.end_minute);
                    column_ends.len() - 1
                }
            }
        })
        .collect()
}

/// Collects the overlap cluster containing `seed` by depth-first search.
fn collect_cluster(seed: usize, extents: &[VerticalExtent], visited: &mut [bool]) -> Vec<usize> {
    let mut cluster = Vec::new();
    let mut stack = vec![seed];
    while let Some(current) = stack.pop() {
        if visited[current] {
            continue;
        }
        visited[current] = true;
        cluster.push(current);
        for (other, extent) in extents.iter().enumerate() {
            if !visited[other] && extents[current].overlaps(extent) {
                stack.push(other);
            }
        }
    }
    cluster
}

/// Re-normalizes raw columns per overlap cluster.
///
/// `columns[i]` is the raw column of `extents[i]`; both slices must have the
/// same length. Within a cluster the distinct raw columns are ranked, and a
/// member in rank `r` of `k` gets `column_fraction = r / k` and
/// `width_fraction = 1 / k`.
#[allow(clippy::cast_precision_loss)]
pub fn normalize_clusters(extents: &[VerticalExtent], columns: &[usize]) -> Vec<ColumnSpan> {
    debug_assert_eq!(extents.len(), columns.len());

    let mut spans = vec![ColumnSpan::FULL; extents.len()];
    let mut visited = vec![false; extents.len()];

    for seed in 0..extents.len() {
        if visited[seed] {
            continue;
        }
        let cluster = collect_cluster(seed, extents, &mut visited);

        let mut distinct: Vec<usize> = cluster.iter().map(|&member| columns[member]).collect();
        distinct.sort_unstable();
        distinct.dedup();
        let count = distinct.len() as f64;

        for &member in &cluster {
            let rank = distinct
                .binary_search(&columns[member])
                .unwrap_or_else(|insert_at| insert_at);
            spans[member] = ColumnSpan {
                column_fraction: rank as f64 / count,
                width_fraction: 1.0 / count,
            };
        }
    }

    spans
}

/// Lays out `items` over `visible_days`.
///
/// Items that are not eligible (completed tasks, deadline tasks without the
/// reminder flag) or that start on a day outside `visible_days` are left out.
/// Output is grouped by day in `visible_days` order, and within a day follows
/// start order.
pub fn layout<'a>(
    items: &'a [SchedulableItem],
    visible_days: &[NaiveDate],
    config: &LayoutConfig,
) -> Vec<PositionedItem<'a>> {
    let mut positioned = Vec::with_capacity(items.len());

    for (day_index, day) in visible_days.iter().enumerate() {
        let mut day_items: Vec<&SchedulableItem> = items
            .iter()
            .filter(|item| item.is_layout_eligible() && item.effective_start().date() == *day)
            .collect();
        // Stable: equal starts keep input order.
        day_items.sort_by_key(|item| item.effective_start());

        let extents: Vec<VerticalExtent> = day_items
            .iter()
            .map(|item| {
                vertical_extent(
                    item.effective_start(),
                    item.effective_end_with(config.deadline_slot()),
                    config,
                )
            })
            .collect();
        let columns = assign_columns(&extents);
        let spans = normalize_clusters(&extents, &columns);

        for (((item, extent), column), span) in
            day_items.into_iter().zip(&extents).zip(&columns).zip(&spans)
        {
            positioned.push(PositionedItem {
                item,
                day_index,
                top: extent.top,
                height: extent.height,
                column_fraction: span.column_fraction,
                width_fraction: span.width_fraction,
                z_index: config
                    .base_z_index
                    .saturating_add(i32::try_from(*column).unwrap_or(i32::MAX)),
            });
        }
    }

    for item in items {
        if item.is_layout_eligible() && !visible_days.contains(&item.effective_start().date()) {
            tracing::trace!(id = %item.id(), "item outside visible days");
        }
    }
    tracing::debug!(
        items = items.len(),
        days = visible_days.len(),
        positioned = positioned.len(),
        "computed calendar layout"
    );

    positioned
}
