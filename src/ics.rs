//! # iCalendar Export
//!
//! Turns [`CalendarEntry`] lists into a VCALENDAR document and writes the
//! `.ics` file for the export command. The document is assembled with the
//! `icalendar` crate and then post-processed line by line: the crate's
//! PRODID gives way to ours, METHOD:PUBLISH is added, and a VTIMEZONE block
//! is spliced in ahead of the first event when the zone has a known
//! template.
//!
//! Zones without a template ship TZID-only date-times; calendar apps
//! resolve IANA names from their own zone tables.

use std::fs;
use std::io;
use std::path::Path;

use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use crate::calendar::CalendarEntry;

const PRODID_LINE: &str = "PRODID:-//tide-planner//Low Tide Calendar//EN";

/// VTIMEZONE for the default station zone, RRULE form of the US Pacific
/// daylight-saving rules.
const VTIMEZONE_LOS_ANGELES: &str = concat!(
    "BEGIN:VTIMEZONE\r\n",
    "TZID:America/Los_Angeles\r\n",
    "X-LIC-LOCATION:America/Los_Angeles\r\n",
    "BEGIN:DAYLIGHT\r\n",
    "TZOFFSETFROM:-0800\r\n",
    "TZOFFSETTO:-0700\r\n",
    "TZNAME:PDT\r\n",
    "DTSTART:19700308T020000\r\n",
    "RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n",
    "END:DAYLIGHT\r\n",
    "BEGIN:STANDARD\r\n",
    "TZOFFSETFROM:-0700\r\n",
    "TZOFFSETTO:-0800\r\n",
    "TZNAME:PST\r\n",
    "DTSTART:19701101T020000\r\n",
    "RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n",
    "END:STANDARD\r\n",
    "END:VTIMEZONE\r\n",
);

/// Render entries into a complete VCALENDAR document.
pub fn render_calendar(entries: &[CalendarEntry], zone: Tz) -> String {
    let mut cal = Calendar::new();

    for entry in entries {
        let mut event = icalendar::Event::new();
        event.uid(&entry.uid);
        event.summary(&entry.summary);
        event.description(&entry.description);
        event.location(&entry.location);
        event.add_property(
            "DTSTAMP",
            entry.dtstamp.format("%Y%m%dT%H%M%SZ").to_string(),
        );

        let mut start = Property::new("DTSTART", entry.start.format("%Y%m%dT%H%M%S").to_string());
        start.add_parameter("TZID", zone.name());
        event.append_property(start);

        let mut end = Property::new("DTEND", entry.end.format("%Y%m%dT%H%M%S").to_string());
        end.add_parameter("TZID", zone.name());
        event.append_property(end);

        cal.push(event.done());
    }

    let cal = cal.done();
    finalize_document(&cal.to_string(), zone)
}

/// Render and write the document to `path`.
pub fn write_calendar(path: &Path, entries: &[CalendarEntry], zone: Tz) -> io::Result<()> {
    fs::write(path, render_calendar(entries, zone))
}

/// Post-process the crate output: our PRODID, METHOD:PUBLISH, and the
/// VTIMEZONE block ahead of the first event.
fn finalize_document(ics: &str, zone: Tz) -> String {
    let mut result = String::with_capacity(ics.len() + VTIMEZONE_LOS_ANGELES.len());
    let mut timezone_pending = true;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(PRODID_LINE);
            result.push_str("\r\n");
            result.push_str("METHOD:PUBLISH\r\n");
            continue;
        }
        if timezone_pending && line == "BEGIN:VEVENT" {
            if let Some(block) = vtimezone_block(zone) {
                result.push_str(block);
            }
            timezone_pending = false;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn vtimezone_block(zone: Tz) -> Option<&'static str> {
    match zone.name() {
        "America/Los_Angeles" => Some(VTIMEZONE_LOS_ANGELES),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_entries;
    use crate::config::StationConfig;
    use crate::TideEvent;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::{Los_Angeles, New_York};

    fn entries() -> Vec<CalendarEntry> {
        let events = vec![
            TideEvent {
                time: Los_Angeles.with_ymd_and_hms(2025, 11, 3, 16, 45, 0).unwrap(),
                height: -0.32,
            },
            TideEvent {
                time: Los_Angeles.with_ymd_and_hms(2025, 11, 4, 17, 30, 0).unwrap(),
                height: -0.87,
            },
        ];
        let station = StationConfig {
            id: "9437585".to_string(),
            name: "Barview / North Jetty (Tillamook Bay)".to_string(),
            location: "Barview / North Jetty, Tillamook Bay, OR".to_string(),
            time_zone: "America/Los_Angeles".to_string(),
        };
        let now = Utc.with_ymd_and_hms(2025, 10, 11, 12, 0, 0).unwrap();
        build_entries(&events, &station, Some(now))
    }

    #[test]
    fn document_carries_header_and_events() {
        let ics = render_calendar(&entries(), Los_Angeles);

        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.contains(PRODID_LINE));
        assert!(ics.contains("VERSION:2.0"));
        assert!(ics.contains("METHOD:PUBLISH"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("UID:low-tide-1@generated"));
        assert!(ics.contains("UID:low-tide-2@generated"));
        assert!(ics.contains("DTSTAMP:20251011T120000Z"));
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20251103T164500"));
        assert!(ics.contains("DTEND;TZID=America/Los_Angeles:20251103T171500"));
        assert!(ics.contains("SUMMARY:Low tide -0.32 ft"));
        // Long lines may be folded, so match only the head of these
        assert!(ics.contains("DESCRIPTION:Predicted low tide"));
        assert!(ics.contains("LOCATION:Barview / North Jetty"));
    }

    #[test]
    fn vtimezone_precedes_the_first_event() {
        let ics = render_calendar(&entries(), Los_Angeles);
        let tz_at = ics.find("BEGIN:VTIMEZONE").expect("timezone block present");
        let event_at = ics.find("BEGIN:VEVENT").expect("events present");
        assert!(tz_at < event_at);
        assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
        assert!(ics.contains("TZNAME:PDT"));
        assert!(ics.contains("TZNAME:PST"));
    }

    #[test]
    fn unknown_zone_gets_tzid_only() {
        let ics = render_calendar(&entries(), New_York);
        assert!(!ics.contains("BEGIN:VTIMEZONE"));
        assert!(ics.contains("DTSTART;TZID=America/New_York:20251103T164500"));
    }

    #[test]
    fn empty_entry_list_still_renders_a_calendar() {
        let ics = render_calendar(&[], Los_Angeles);
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
        assert!(!ics.contains("BEGIN:VTIMEZONE"));
    }

    #[test]
    fn writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lows.ics");
        write_calendar(&path, &entries(), Los_Angeles).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("BEGIN:VCALENDAR"));
        assert_eq!(written, render_calendar(&entries(), Los_Angeles));
    }
}
