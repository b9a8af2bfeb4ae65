//! # HTML Rendering
//!
//! Builds the two server pages as plain strings: the search form and the
//! calendar results. Everything user- or upstream-supplied passes through
//! [`escape_html`] here; the grid and station structs arrive unescaped.

use chrono::NaiveDate;

use crate::calendar::{CalendarGrid, DayCell, MonthSection};
use crate::config::{FilterConfig, StationConfig};
use crate::noaa::Station;

const DAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 64rem; padding: 0 1rem; color: #1c2b33; }
h1 { margin-bottom: 0.25rem; }
form { display: grid; gap: 0.75rem; max-width: 28rem; margin: 1.5rem 0; }
label { display: grid; gap: 0.25rem; font-size: 0.9rem; }
input, select, button { font: inherit; padding: 0.35rem; }
button { cursor: pointer; width: fit-content; padding: 0.45rem 1.2rem; }
.error { color: #a4262c; }
.meta { color: #50616b; }
section.month { margin: 2rem 0; }
table.calendar { border-collapse: collapse; width: 100%; }
table.calendar th { padding: 0.3rem; background: #eef3f6; border: 1px solid #cfd9df; }
td.day { border: 1px solid #cfd9df; vertical-align: top; width: 14.28%; height: 4.5rem; padding: 0.25rem; }
td.other-month { background: #f6f8f9; color: #9aa7af; }
td.has-event { background: #e2f2e4; }
.date-label { font-weight: 600; font-size: 0.85rem; }
.events { font-size: 0.8rem; margin-top: 0.25rem; line-height: 1.4; }
"#;

/// Escape text for safe interpolation into HTML.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The search form page.
///
/// Stations populate the picker; when the directory fetch failed the page
/// still renders, with the error noted and the configured station as the
/// only choice.
pub fn render_index(
    stations: &[Station],
    stations_error: Option<&str>,
    station: &StationConfig,
    filter: &FilterConfig,
) -> String {
    let mut body = String::new();
    body.push_str("<h1>Low tide finder</h1>\n");
    body.push_str(
        "<p class=\"meta\">Pick a station and a date range to see predicted low tides \
         below your height cutoff during daytime hours.</p>\n",
    );

    if let Some(error) = stations_error {
        body.push_str(&format!(
            "<p class=\"error\">Could not load the station list: {}</p>\n",
            escape_html(error)
        ));
    }

    body.push_str("<form method=\"post\" action=\"/results\">\n");
    body.push_str("<label>Station\n<select name=\"station\">\n");
    if stations.is_empty() {
        body.push_str(&station_option(&station.id, &station.name, "", &station.id));
    } else {
        for s in stations {
            body.push_str(&station_option(&s.id, &s.name, &s.state, &station.id));
        }
    }
    body.push_str("</select>\n</label>\n");

    body.push_str(
        "<label>Begin date\n<input type=\"date\" name=\"begin_date\" required>\n</label>\n",
    );
    body.push_str("<label>End date\n<input type=\"date\" name=\"end_date\" required>\n</label>\n");
    body.push_str(&format!(
        "<label>Earliest time\n<input type=\"time\" name=\"start_time\" value=\"{:02}:00\">\n</label>\n",
        filter.start_hour
    ));
    body.push_str(&format!(
        "<label>Latest time\n<input type=\"time\" name=\"end_time\" value=\"{:02}:00\">\n</label>\n",
        filter.end_hour
    ));
    body.push_str(&format!(
        "<label>Height cutoff (ft, keeps tides strictly below)\n\
         <input type=\"number\" name=\"min_level\" step=\"0.01\" value=\"{}\">\n</label>\n",
        filter.min_height
    ));
    body.push_str("<button type=\"submit\">Show low tides</button>\n</form>\n");

    page("Low tide finder", &body)
}

/// The results page: a heading, the search summary, and the month grid.
pub fn render_results(
    grid: &CalendarGrid,
    station_label: &str,
    begin: NaiveDate,
    end: NaiveDate,
) -> String {
    let mut body = String::new();
    body.push_str("<h1>Low tides</h1>\n");
    body.push_str(&format!(
        "<p class=\"meta\">Station {}, {} to {}</p>\n",
        escape_html(station_label),
        begin,
        end
    ));
    body.push_str("<p><a href=\"/\">New search</a></p>\n");
    body.push_str(&render_grid(grid));
    page("Low tides", &body)
}

/// Month sections as HTML, or the no-events note when the grid is empty.
pub fn render_grid(grid: &CalendarGrid) -> String {
    if grid.is_empty() {
        return "<p>No matching events found.</p>".to_string();
    }
    grid.months.iter().map(render_month).collect()
}

fn render_month(section: &MonthSection) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"month\">\n");
    html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
    html.push_str("<table class=\"calendar\">\n<thead>\n<tr>");
    for day in DAY_HEADERS {
        html.push_str(&format!("<th>{day}</th>"));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for week in &section.weeks {
        html.push_str("<tr>");
        for cell in week {
            html.push_str(&render_cell(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</section>\n");
    html
}

fn render_cell(cell: &DayCell) -> String {
    let mut classes = vec!["day"];
    if cell.other_month {
        classes.push("other-month");
    }
    if cell.has_events() {
        classes.push("has-event");
    }

    let events = if cell.lines.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = cell.lines.iter().map(|line| escape_html(line)).collect();
        format!("<div class=\"events\">{}</div>", lines.join("<br>"))
    };

    format!(
        "<td class=\"{}\"><div class=\"date-label\">{}</div>{}</td>",
        classes.join(" "),
        cell.day_number(),
        events
    )
}

fn station_option(id: &str, name: &str, state: &str, selected_id: &str) -> String {
    let mut label = format!("{id} — {name}");
    if !state.is_empty() {
        label.push_str(&format!(" ({state})"));
    }
    let selected = if id == selected_id { " selected" } else { "" };
    format!(
        "<option value=\"{}\"{}>{}</option>\n",
        escape_html(id),
        selected,
        escape_html(&label)
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}
