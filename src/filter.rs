//! # Low-Tide Filtering
//!
//! Screens raw datagetter records down to the low tides worth planning
//! around: strictly below a height cutoff and inside a daily clock-hour
//! window, read in the station's own timezone.
//!
//! Screening never fails as a whole. Each record either becomes a
//! [`TideEvent`] or is dropped with a named [`SkipReason`], so a caller that
//! cares (or a test) can see exactly why a record fell out while ordinary
//! callers just take the surviving events in input order.

use chrono::{NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use tracing::trace;

use crate::{RawPrediction, TideEvent};

/// Accepted timestamp shapes, tried in order. NOAA emits the first; the
/// rest cover ISO-8601 variants seen in hand-fed data, with or without
/// seconds and fractional seconds.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Selection rules for qualifying low tides.
///
/// The hour window is inclusive on both ends and does not wrap midnight:
/// `start_hour > end_hour` matches nothing. The timezone is attached to each
/// record's naive local timestamp, it never shifts the wall-clock value.
#[derive(Clone, Debug)]
pub struct FilterCriteria {
    /// Keep only heights strictly below this value in feet
    pub min_height: f64,
    /// Earliest qualifying local hour, inclusive (0-23)
    pub start_hour: u32,
    /// Latest qualifying local hour, inclusive (0-23)
    pub end_hour: u32,
    /// Zone the station's local timestamps are interpreted in
    pub time_zone: Tz,
}

/// Why a record did not become an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Kind field was not a low-tide marker
    NotLow,
    /// Height text did not parse as a number
    BadHeight,
    /// Timestamp matched no accepted shape, or named a local time the zone
    /// skips over (spring-forward gap)
    BadTimestamp,
    /// Height not strictly below the cutoff
    AboveCutoff,
    /// Local hour outside the inclusive window
    OutsideHours,
}

/// Outcome of screening a single record.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Kept(TideEvent),
    Skipped(SkipReason),
}

/// Screen one raw record against the criteria.
///
/// Ambiguous local times (the repeated hour at the end of daylight saving)
/// resolve to the earlier offset; NOAA's `lst_ldt` output does not normally
/// produce them.
pub fn screen_record(record: &RawPrediction, criteria: &FilterCriteria) -> Outcome {
    if !record.is_low() {
        return Outcome::Skipped(SkipReason::NotLow);
    }

    let height: f64 = match record.v.trim().parse() {
        Ok(h) => h,
        Err(_) => return Outcome::Skipped(SkipReason::BadHeight),
    };

    let naive = match parse_timestamp(&record.t) {
        Some(n) => n,
        None => return Outcome::Skipped(SkipReason::BadTimestamp),
    };

    let time = match criteria.time_zone.from_local_datetime(&naive).earliest() {
        Some(t) => t,
        None => return Outcome::Skipped(SkipReason::BadTimestamp),
    };

    // NaN satisfies neither `<` nor `>=`; only the positive comparison
    // may qualify a record
    let below_cutoff = height < criteria.min_height;
    if !below_cutoff {
        return Outcome::Skipped(SkipReason::AboveCutoff);
    }
    let hour = time.hour();
    if hour < criteria.start_hour || hour > criteria.end_hour {
        return Outcome::Skipped(SkipReason::OutsideHours);
    }

    Outcome::Kept(TideEvent { time, height })
}

/// Filter a prediction batch down to qualifying low-tide events.
///
/// Input order is preserved, malformed records are dropped silently at this
/// level (use [`screen_record`] to see the reasons), and an empty result is
/// a normal answer, not an error.
pub fn filter_low_tides(records: &[RawPrediction], criteria: &FilterCriteria) -> Vec<TideEvent> {
    records
        .iter()
        .filter_map(|record| match screen_record(record, criteria) {
            Outcome::Kept(event) => Some(event),
            Outcome::Skipped(reason) => {
                trace!(t = %record.t, ?reason, "skipped record");
                None
            }
        })
        .collect()
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
