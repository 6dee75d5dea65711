//! Visible date ranges and the mapping from layout fractions to the screen.

use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutConfig, PositionedItem};
use crate::types::ValidationError;

/// Length of the draft event created from a clicked time slot.
pub const DRAFT_DURATION_MINUTES: i64 = 60;

/// Calendar views. Day and week use the hour grid; month is a per-date agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    Week,
    Month,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Whether items are laid out on the hour grid for this view.
    #[must_use]
    pub const fn uses_grid(&self) -> bool {
        matches!(self, Self::Day | Self::Week)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First day of the week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// First day of the week containing `date`, or `None` past the calendar's start.
pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> Option<NaiveDate> {
    let offset = match week_start {
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        WeekStart::Monday => date.weekday().num_days_from_monday(),
    };
    date.checked_sub_signed(Duration::days(i64::from(offset)))
}

/// Last day of the week containing `date`, or `None` past the calendar's end.
pub fn end_of_week(date: NaiveDate, week_start: WeekStart) -> Option<NaiveDate> {
    start_of_week(date, week_start)?.checked_add_signed(Duration::days(6))
}

/// First and last day shown by `mode` around `anchor`.
///
/// A month view is padded out to whole weeks on both sides.
fn visible_bounds(mode: ViewMode, anchor: NaiveDate, week_start: WeekStart) -> Option<(NaiveDate, NaiveDate)> {
    match mode {
        ViewMode::Day => Some((anchor, anchor)),
        ViewMode::Week => Some((
            start_of_week(anchor, week_start)?,
            end_of_week(anchor, week_start)?,
        )),
        ViewMode::Month => {
            let month_start = anchor.with_day(1)?;
            let month_end = month_start.checked_add_months(Months::new(1))?.pred_opt()?;
            Some((
                start_of_week(month_start, week_start)?,
                end_of_week(month_end, week_start)?,
            ))
        }
    }
}

/// The ordered, contiguous days shown by `mode` around `anchor`.
///
/// Empty when the view would run off either end of the representable calendar.
pub fn visible_days(mode: ViewMode, anchor: NaiveDate, week_start: WeekStart) -> Vec<NaiveDate> {
    visible_bounds(mode, anchor, week_start).map_or_else(Vec::new, |(first, last)| {
        first.iter_days().take_while(|day| *day <= last).collect()
    })
}

/// Moves `anchor` one view-length backwards or forwards.
///
/// Returns `None` when the result is not a representable date.
pub fn step(mode: ViewMode, anchor: NaiveDate, direction: Direction) -> Option<NaiveDate> {
    let days = match mode {
        ViewMode::Day => Duration::days(1),
        ViewMode::Week => Duration::days(7),
        ViewMode::Month => {
            return match direction {
                Direction::Previous => anchor.checked_sub_months(Months::new(1)),
                Direction::Next => anchor.checked_add_months(Months::new(1)),
            };
        }
    };
    match direction {
        Direction::Previous => anchor.checked_sub_signed(days),
        Direction::Next => anchor.checked_add_signed(days),
    }
}

/// Header text for a view: "Monday, January 1, 2024", "Jan 1 - Jan 7, 2024" or "January 2024".
pub fn period_title(mode: ViewMode, anchor: NaiveDate, week_start: WeekStart) -> String {
    match mode {
        ViewMode::Day => anchor.format("%A, %B %-d, %Y").to_string(),
        ViewMode::Week => {
            let (first, last) = visible_bounds(mode, anchor, week_start).unwrap_or((anchor, anchor));
            format!("{} - {}", first.format("%b %-d"), last.format("%b %-d, %Y"))
        }
        ViewMode::Month => anchor.format("%B %Y").to_string(),
    }
}

/// Pixel offset of the current-time line in `day`'s column, if `now` is on `day`.
pub fn now_indicator_offset(now: NaiveDateTime, day: NaiveDate, config: &LayoutConfig) -> Option<f64> {
    if now.date() != day {
        return None;
    }
    let minutes = f64::from(now.hour() * 60 + now.minute());
    Some(minutes / 60.0 * f64::from(config.hour_height))
}

/// The default range for an event created by clicking the `hour` slot of `day`.
pub fn draft_slot(day: NaiveDate, hour: u32) -> Result<(NaiveDateTime, NaiveDateTime), ValidationError> {
    let start = day
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            value: format!("{day} hour {hour}"),
        })?;
    Ok((start, start + Duration::minutes(DRAFT_DURATION_MINUTES)))
}

/// Horizontal placement across the whole day-columns area, as fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalSpan {
    pub left: f64,
    pub width: f64,
}

impl HorizontalSpan {
    /// Maps a day-local layout result onto an area of `total_days` equal columns.
    #[allow(clippy::cast_precision_loss)]
    pub fn of(positioned: &PositionedItem<'_>, total_days: usize) -> Self {
        let days = total_days.max(1) as f64;
        Self {
            left: (positioned.day_index as f64 + positioned.column_fraction) / days,
            width: positioned.width_fraction / days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::fixtures::{at, event};
    use crate::layout::layout;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday_by_default() {
        // Jan 3, 2024 is a Wednesday.
        let days = visible_days(ViewMode::Week, date(2024, 1, 3), WeekStart::default());
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2023, 12, 31));
        assert_eq!(days[6], date(2024, 1, 6));
    }

    #[test]
    fn week_can_start_on_monday() {
        let days = visible_days(ViewMode::Week, date(2024, 1, 7), WeekStart::Monday);
        assert_eq!(days[0], date(2024, 1, 1));
        assert_eq!(days[6], date(2024, 1, 7));
        assert!(days.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
    }

    #[test]
    fn day_view_is_the_anchor() {
        let anchor = date(2024, 2, 29);
        assert_eq!(visible_days(ViewMode::Day, anchor, WeekStart::Monday), [anchor]);
    }

    #[test]
    fn step_moves_by_view_length() {
        let anchor = date(2024, 1, 31);
        assert_eq!(step(ViewMode::Day, anchor, Direction::Next), Some(date(2024, 2, 1)));
        assert_eq!(
            step(ViewMode::Week, anchor, Direction::Previous),
            Some(date(2024, 1, 24))
        );
    }

    #[test]
    fn month_step_clamps_to_shorter_months() {
        let anchor = date(2024, 1, 31);
        assert_eq!(step(ViewMode::Month, anchor, Direction::Next), Some(date(2024, 2, 29)));
        assert_eq!(
            step(ViewMode::Month, date(2024, 3, 31), Direction::Previous),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            step(ViewMode::Month, date(2024, 12, 15), Direction::Next),
            Some(date(2025, 1, 15))
        );
    }

    #[test]
    fn month_is_padded_to_whole_weeks() {
        // January 2024 runs Monday the 1st to Wednesday the 31st.
        let days = visible_days(ViewMode::Month, date(2024, 1, 17), WeekStart::Sunday);
        assert_eq!(days.first(), Some(&date(2023, 12, 31)));
        assert_eq!(days.last(), Some(&date(2024, 2, 3)));
        assert_eq!(days.len(), 35);
        assert!(days.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));

        let days = visible_days(ViewMode::Month, date(2024, 1, 17), WeekStart::Monday);
        assert_eq!(days.first(), Some(&date(2024, 1, 1)));
        assert_eq!(days.last(), Some(&date(2024, 2, 4)));
        assert_eq!(days.len() % 7, 0);
    }

    #[test]
    fn stepping_off_the_calendar_is_none() {
        assert_eq!(step(ViewMode::Day, NaiveDate::MAX, Direction::Next), None);
        assert_eq!(step(ViewMode::Week, NaiveDate::MIN, Direction::Previous), None);
        assert_eq!(step(ViewMode::Month, NaiveDate::MAX, Direction::Next), None);
        assert!(visible_days(ViewMode::Month, NaiveDate::MAX, WeekStart::Sunday).is_empty());
        assert!(!period_title(ViewMode::Week, NaiveDate::MAX, WeekStart::Sunday).is_empty());
    }

    #[test]
    fn titles_match_view() {
        let anchor = date(2024, 1, 3);
        assert_eq!(
            period_title(ViewMode::Week, anchor, WeekStart::Monday),
            "Jan 1 - Jan 7, 2024"
        );
        assert_eq!(
            period_title(ViewMode::Day, date(2024, 1, 1), WeekStart::Sunday),
            "Monday, January 1, 2024"
        );
        assert_eq!(
            period_title(ViewMode::Month, date(2024, 1, 31), WeekStart::Sunday),
            "January 2024"
        );
    }

    #[test]
    fn now_indicator_only_on_its_day() {
        let config = LayoutConfig::default();
        let now = at(2, 13, 30);
        assert_eq!(now_indicator_offset(now, date(2024, 1, 2), &config), Some(810.0));
        assert_eq!(now_indicator_offset(now, date(2024, 1, 3), &config), None);
    }

    #[test]
    fn draft_slot_is_one_hour() {
        let (start, end) = draft_slot(date(2024, 1, 2), 9).unwrap();
        assert_eq!(start, at(2, 9, 0));
        assert_eq!(end, at(2, 10, 0));
        assert!(draft_slot(date(2024, 1, 2), 24).is_err());
    }

    #[test]
    fn horizontal_span_offsets_by_day() {
        let items = vec![
            event("a", at(3, 9, 0), at(3, 10, 0)),
            event("b", at(3, 9, 30), at(3, 10, 30)),
        ];
        let days = visible_days(ViewMode::Week, date(2024, 1, 1), WeekStart::Monday);
        let out = layout(&items, &days, &LayoutConfig::default());

        let b = HorizontalSpan::of(&out[1], days.len());
        assert!((b.left - 2.5 / 7.0).abs() < 1e-12);
        assert!((b.width - 0.5 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn horizontal_span_tolerates_zero_days() {
        let items = vec![event("a", at(3, 9, 0), at(3, 10, 0))];
        let out = layout(&items, &[date(2024, 1, 3)], &LayoutConfig::default());
        let span = HorizontalSpan::of(&out[0], 0);
        assert!((span.width - 1.0).abs() < f64::EPSILON);
    }
}
