//! # Calendar Projection
//!
//! Projects qualifying low-tide events onto the two shapes the planner
//! serves: a month-by-month grid for the browser and a flat list of
//! fixed-duration entries for `.ics` export.
//!
//! Both projections are pure. The grid depends only on the events and the
//! requested date range; entry building reads the wall clock once for the
//! shared creation stamp, and that read is injectable so tests (and anything
//! else that wants reproducible output) can pin it.
//!
//! ## Grid shape
//!
//! The grid covers every month from the month of `begin_date` through the
//! month of `end_date`, one [`MonthSection`] each. Weeks start on Sunday and
//! are padded with neighboring-month days to full rows; those filler cells
//! are flagged [`DayCell::other_month`] and never carry events, so a tide
//! shows up exactly once even when its date also appears in an adjacent
//! section's padding row.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::config::StationConfig;
use crate::TideEvent;

/// One cell of a month grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DayCell {
    /// Calendar date this cell shows
    pub date: NaiveDate,
    /// True when the date lies inside the requested begin/end range
    pub in_range: bool,
    /// True when the date belongs to a neighboring month, shown only to
    /// complete the week row
    pub other_month: bool,
    /// Formatted event lines, e.g. `4:45 PM  -0.32 ft`
    pub lines: Vec<String>,
}

impl DayCell {
    /// Day-of-month number for the cell label.
    pub fn day_number(&self) -> u32 {
        self.date.day()
    }

    pub fn has_events(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// One displayed month: a title plus Sunday-first week rows of seven cells.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSection {
    /// Display title, e.g. `November 2025`
    pub title: String,
    /// Week rows, each exactly seven cells starting on Sunday
    pub weeks: Vec<Vec<DayCell>>,
}

/// The month sections spanning a requested date range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalendarGrid {
    pub months: Vec<MonthSection>,
}

impl CalendarGrid {
    /// True when no month sections were produced. Renderers show a
    /// "no matching events" note instead of an empty table.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// A fixed 30-minute export entry derived from one low-tide event.
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEntry {
    /// Stable id within one export, `low-tide-<n>@generated`, 1-based
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    /// Predicted low, zone-aware
    pub start: DateTime<Tz>,
    /// Thirty minutes after `start`
    pub end: DateTime<Tz>,
    /// Creation stamp shared by every entry of one build
    pub dtstamp: DateTime<Utc>,
}

/// Group events by calendar date. Per-day order is input order.
pub fn bucket_by_day(events: &[TideEvent]) -> BTreeMap<NaiveDate, Vec<TideEvent>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<TideEvent>> = BTreeMap::new();
    for event in events {
        buckets.entry(event.date()).or_default().push(event.clone());
    }
    buckets
}

/// Build the month grid for `[begin_date, end_date]`.
///
/// Every month in the span gets a section even when no event falls in it.
/// Events attach only to in-month cells whose date lies inside the range;
/// an empty `events` slice still yields the full set of sections.
pub fn build_grid(events: &[TideEvent], begin_date: NaiveDate, end_date: NaiveDate) -> CalendarGrid {
    let buckets = bucket_by_day(events);
    let mut months = Vec::new();

    let mut current = first_of_month(begin_date);
    let last_month = first_of_month(end_date);
    while current <= last_month {
        months.push(build_month(current, begin_date, end_date, &buckets));
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    CalendarGrid { months }
}

/// Build the export entries for a station, in event order.
///
/// `now` is the creation stamp applied to every entry; pass `None` to use
/// the current time. Entry uids restart at 1 for each build.
pub fn build_entries(
    events: &[TideEvent],
    station: &StationConfig,
    now: Option<DateTime<Utc>>,
) -> Vec<CalendarEntry> {
    let dtstamp = now.unwrap_or_else(Utc::now);
    events
        .iter()
        .enumerate()
        .map(|(i, event)| CalendarEntry {
            uid: format!("low-tide-{}@generated", i + 1),
            summary: format!("Low tide {:.2} ft — {}", event.height, station.name),
            description: format!(
                "Predicted low tide of {:.2} ft (NOAA predictions). Station {}.",
                event.height, station.id
            ),
            location: station.location.clone(),
            start: event.time,
            end: event.time + Duration::minutes(30),
            dtstamp,
        })
        .collect()
}

fn build_month(
    month_start: NaiveDate,
    begin_date: NaiveDate,
    end_date: NaiveDate,
    buckets: &BTreeMap<NaiveDate, Vec<TideEvent>>,
) -> MonthSection {
    let title = month_start.format("%B %Y").to_string();
    let month = month_start.month();
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .unwrap_or(month_start);

    // Back up to the Sunday on or before the 1st, then take whole weeks
    // until the month is exhausted.
    let lead = i64::from(month_start.weekday().num_days_from_sunday());
    let mut cursor = month_start - Duration::days(lead);

    let mut weeks = Vec::new();
    while cursor < month_end {
        let mut week = Vec::with_capacity(7);
        for _ in 0..7 {
            let other_month = cursor.month() != month;
            let in_range = cursor >= begin_date && cursor <= end_date;
            let lines = if other_month || !in_range {
                Vec::new()
            } else {
                buckets
                    .get(&cursor)
                    .map(|events| events.iter().map(event_line).collect())
                    .unwrap_or_default()
            };
            week.push(DayCell {
                date: cursor,
                in_range,
                other_month,
                lines,
            });
            cursor += Duration::days(1);
        }
        weeks.push(week);
    }

    MonthSection { title, weeks }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `4:45 PM  -0.32 ft`: 12-hour clock without a leading zero, height to
/// two decimals.
fn event_line(event: &TideEvent) -> String {
    format!("{}  {:.2} ft", event.time.format("%-I:%M %p"), event.height)
}
