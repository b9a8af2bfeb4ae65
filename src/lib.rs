//! # Tide Planner Core Library
//!
//! This library turns NOAA tide predictions into things you can plan around:
//! a filtered list of daylight low tides, a month-by-month calendar grid for
//! the browser, and fixed-duration entries for an `.ics` calendar file.
//!
//! ## Design Philosophy
//!
//! ### Pure core, thin edges
//! - **Filtering** ([`filter`]) and **projection** ([`calendar`]) are pure
//!   functions over fully materialized inputs. No I/O, no shared state, no
//!   clock reads apart from one injectable timestamp in entry building.
//! - **Collaborators** ([`noaa`], [`ics`], [`html`], [`server`]) do the
//!   talking: HTTP to NOAA, iCalendar text, escaped HTML, the web routes.
//!
//! ### One timezone, threaded explicitly
//! NOAA's `lst_ldt` timestamps are local wall-clock text with no offset. The
//! station's IANA zone comes from configuration and is passed into the filter,
//! which attaches it to each parsed timestamp. Nothing in the crate consults a
//! process-wide zone.
//!
//! ### Data Flow
//! 1. **Fetch**: [`noaa::fetch_predictions`] → raw `{t, v, type}` records
//! 2. **Filter**: [`filter::filter_low_tides`] → timezone-aware [`TideEvent`]s
//! 3. **Project**: [`calendar::build_grid`] for the web view, or
//!    [`calendar::build_entries`] → [`ics::render_calendar`] for export
//!
//! ## Core Types
//!
//! - [`RawPrediction`]: one extremum exactly as the datagetter reports it
//! - [`TideEvent`]: one qualifying low tide with a zone-aware timestamp

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// Module declarations
pub mod calendar;
pub mod config;
pub mod filter;
pub mod html;
pub mod ics;
pub mod noaa;
pub mod server;

#[cfg(test)]
mod tests;

/// A single high/low prediction record from the NOAA datagetter.
///
/// Field names follow the wire format so the response body deserializes
/// directly. Heights arrive as strings (`"-0.32"`) and timestamps as local
/// wall-clock text (`"2025-11-03 16:45"`); both stay untouched here so the
/// filter step can decide what to do with malformed values record by record.
///
/// # Example
/// ```
/// use tide_planner_lib::RawPrediction;
///
/// let record = RawPrediction {
///     t: "2025-11-03 16:45".into(),
///     v: "-0.32".into(),
///     kind: "L".into(),
/// };
/// assert!(record.is_low());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Local date-time text, `YYYY-MM-DD HH:MM`, no offset suffix
    pub t: String,
    /// Height in feet relative to the datum, string-encoded decimal
    pub v: String,
    /// Extremum kind: `"H"` or `"L"` (case varies upstream)
    #[serde(rename = "type")]
    pub kind: String,
}

impl RawPrediction {
    /// True when this record is a low-tide extremum (`"L"`/`"l"`/`"low"`).
    pub fn is_low(&self) -> bool {
        let kind = self.kind.trim();
        kind.eq_ignore_ascii_case("l") || kind.eq_ignore_ascii_case("low")
    }
}

/// A qualifying low-tide occurrence in the station's timezone.
///
/// Produced only by [`filter::filter_low_tides`]; the height is carried
/// through from the raw record unchanged, and the timestamp is the raw local
/// wall-clock time with the configured zone attached (an interpretation, not
/// a conversion).
///
/// # Example
/// ```
/// use chrono::TimeZone;
/// use chrono_tz::America::Los_Angeles;
/// use tide_planner_lib::TideEvent;
///
/// let event = TideEvent {
///     time: Los_Angeles.with_ymd_and_hms(2025, 11, 3, 16, 45, 0).unwrap(),
///     height: -0.32,
/// };
/// assert_eq!(event.date().to_string(), "2025-11-03");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TideEvent {
    /// Moment of the predicted low, zone-aware
    pub time: DateTime<Tz>,
    /// Predicted height in feet, negative = below MLLW
    pub height: f64,
}

impl TideEvent {
    /// Calendar date of the event in its own timezone.
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }
}
