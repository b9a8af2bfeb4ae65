//! # Web Server
//!
//! The HTTP face of the planner: the search form at `/`, the calendar at
//! `/results` (GET or POST, same parameters), and the station directory at
//! `/stations.json`. All request validation happens here; the filter and
//! projector only ever see well-formed dates and hours.

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{Config, FilterConfig};
use crate::filter::{self, FilterCriteria};
use crate::noaa::{self, NoaaError};
use crate::{calendar, html};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub time_zone: Tz,
    pub client: reqwest::Client,
}

impl AppState {
    /// Validate the configured timezone and build the NOAA client up front,
    /// so a bad config fails at startup rather than per request.
    pub fn new(config: Config) -> Result<Self> {
        let time_zone = config.time_zone()?;
        let client = noaa::client()?;
        Ok(Self {
            config,
            time_zone,
            client,
        })
    }
}

/// Handler error, mapped onto a status code and a plain-text body.
#[derive(Debug)]
pub enum AppError {
    /// Invalid or missing request parameter
    BadRequest(String),
    /// Upstream NOAA failure
    Upstream(NoaaError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching predictions: {err}"),
            ),
        };
        (status, body).into_response()
    }
}

impl From<NoaaError> for AppError {
    fn from(err: NoaaError) -> Self {
        AppError::Upstream(err)
    }
}

/// Query/form parameters accepted by `/results`.
///
/// Everything is optional at the wire level; [`parse_params`] decides what
/// is required and what falls back to the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsParams {
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub begin_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub min_level: Option<String>,
}

/// A validated search, ready for fetch and filter.
struct SearchRequest {
    station: String,
    begin: NaiveDate,
    end: NaiveDate,
    criteria: FilterCriteria,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/results", get(results_get).post(results_post))
        .route("/stations.json", get(stations_json))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let (stations, stations_error) = match noaa::fetch_stations(&state.client).await {
        Ok(stations) => (stations, None),
        Err(err) => {
            error!("station directory fetch failed: {err}");
            (Vec::new(), Some(err.to_string()))
        }
    };
    Html(html::render_index(
        &stations,
        stations_error.as_deref(),
        &state.config.station,
        &state.config.filter,
    ))
}

async fn results_get(
    State(state): State<AppState>,
    Query(params): Query<ResultsParams>,
) -> Result<Html<String>, AppError> {
    results(state, params).await
}

async fn results_post(
    State(state): State<AppState>,
    Form(params): Form<ResultsParams>,
) -> Result<Html<String>, AppError> {
    results(state, params).await
}

async fn results(state: AppState, params: ResultsParams) -> Result<Html<String>, AppError> {
    let request = parse_params(params, &state.config.filter, state.time_zone)?;

    let records =
        noaa::fetch_predictions(&state.client, &request.station, request.begin, request.end)
            .await?;
    let events = filter::filter_low_tides(&records, &request.criteria);
    info!(
        station = %request.station,
        records = records.len(),
        events = events.len(),
        "search complete"
    );

    let grid = calendar::build_grid(&events, request.begin, request.end);
    Ok(Html(html::render_results(
        &grid,
        &request.station,
        request.begin,
        request.end,
    )))
}

async fn stations_json(State(state): State<AppState>) -> Response {
    match noaa::fetch_stations(&state.client).await {
        Ok(stations) => Json(json!({ "stations": stations })).into_response(),
        Err(err) => {
            error!("station directory fetch failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn parse_params(
    params: ResultsParams,
    defaults: &FilterConfig,
    time_zone: Tz,
) -> Result<SearchRequest, AppError> {
    let station = trimmed(params.station)
        .ok_or_else(|| AppError::BadRequest("Missing station".to_string()))?;
    let begin = parse_date(trimmed(params.begin_date), "begin_date")?;
    let end = parse_date(trimmed(params.end_date), "end_date")?;
    if end < begin {
        return Err(AppError::BadRequest(
            "end_date must not be before begin_date".to_string(),
        ));
    }

    let start_hour = match trimmed(params.start_time) {
        Some(text) => parse_hour(&text, "start_time")?,
        None => defaults.start_hour,
    };
    let end_hour = match trimmed(params.end_time) {
        Some(text) => parse_hour(&text, "end_time")?,
        None => defaults.end_hour,
    };
    let min_height = match trimmed(params.min_level) {
        Some(text) => text
            .parse::<f64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid min_level: {text:?}")))?,
        None => defaults.min_height,
    };

    Ok(SearchRequest {
        station,
        begin,
        end,
        criteria: FilterCriteria {
            min_height,
            start_hour,
            end_hour,
            time_zone,
        },
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(value: Option<String>, name: &str) -> Result<NaiveDate, AppError> {
    let text = value.ok_or_else(|| AppError::BadRequest(format!("Missing {name}")))?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {name}: expected YYYY-MM-DD")))
}

/// Take the hour from an `HH:MM` form value.
fn parse_hour(text: &str, name: &str) -> Result<u32, AppError> {
    let hour_part = text.split(':').next().unwrap_or(text);
    let hour: u32 = hour_part
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {name}: {text:?}")))?;
    if hour > 23 {
        return Err(AppError::BadRequest(format!("Invalid {name}: {text:?}")));
    }
    Ok(hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    fn defaults() -> FilterConfig {
        FilterConfig {
            min_height: 0.0,
            start_hour: 8,
            end_hour: 19,
        }
    }

    fn params(station: &str, begin: &str, end: &str) -> ResultsParams {
        ResultsParams {
            station: Some(station.to_string()),
            begin_date: Some(begin.to_string()),
            end_date: Some(end.to_string()),
            ..ResultsParams::default()
        }
    }

    fn bad_request(result: Result<SearchRequest, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            Err(other) => panic!("expected bad request, got {other:?}"),
            Ok(_) => panic!("expected bad request, got a parsed search"),
        }
    }

    #[test]
    fn defaults_fill_the_optional_fields() {
        let request = parse_params(
            params("9437585", "2025-10-11", "2026-10-11"),
            &defaults(),
            Los_Angeles,
        )
        .unwrap();
        assert_eq!(request.station, "9437585");
        assert_eq!(request.begin.to_string(), "2025-10-11");
        assert_eq!(request.end.to_string(), "2026-10-11");
        assert_eq!(request.criteria.start_hour, 8);
        assert_eq!(request.criteria.end_hour, 19);
        assert_eq!(request.criteria.min_height, 0.0);
        assert_eq!(request.criteria.time_zone, Los_Angeles);
    }

    #[test]
    fn explicit_fields_override_the_defaults() {
        let mut p = params("9437585", "2025-10-11", "2025-12-31");
        p.start_time = Some("10:30".to_string());
        p.end_time = Some("16:00".to_string());
        p.min_level = Some("-0.5".to_string());
        let request = parse_params(p, &defaults(), Los_Angeles).unwrap();
        assert_eq!(request.criteria.start_hour, 10);
        assert_eq!(request.criteria.end_hour, 16);
        assert_eq!(request.criteria.min_height, -0.5);
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let mut p = params("  ", "2025-10-11", "2025-12-31");
        p.start_time = Some(String::new());
        let msg = bad_request(parse_params(p, &defaults(), Los_Angeles));
        assert_eq!(msg, "Missing station");
    }

    #[test]
    fn missing_dates_are_rejected() {
        let p = ResultsParams {
            station: Some("9437585".to_string()),
            ..ResultsParams::default()
        };
        let msg = bad_request(parse_params(p, &defaults(), Los_Angeles));
        assert_eq!(msg, "Missing begin_date");
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let msg = bad_request(parse_params(
            params("9437585", "10/11/2025", "2025-12-31"),
            &defaults(),
            Los_Angeles,
        ));
        assert_eq!(msg, "Invalid begin_date: expected YYYY-MM-DD");
    }

    #[test]
    fn reversed_ranges_are_rejected() {
        let msg = bad_request(parse_params(
            params("9437585", "2025-12-31", "2025-10-11"),
            &defaults(),
            Los_Angeles,
        ));
        assert_eq!(msg, "end_date must not be before begin_date");
    }

    #[test]
    fn single_day_range_is_allowed() {
        let request = parse_params(
            params("9437585", "2025-11-01", "2025-11-01"),
            &defaults(),
            Los_Angeles,
        )
        .unwrap();
        assert_eq!(request.begin, request.end);
    }

    #[test]
    fn nonsense_times_are_rejected() {
        for bad in ["late", "25:00", "-1:30"] {
            let mut p = params("9437585", "2025-10-11", "2025-12-31");
            p.start_time = Some(bad.to_string());
            let msg = bad_request(parse_params(p, &defaults(), Los_Angeles));
            assert!(msg.starts_with("Invalid start_time"), "{bad} -> {msg}");
        }
    }

    #[test]
    fn nonsense_levels_are_rejected() {
        let mut p = params("9437585", "2025-10-11", "2025-12-31");
        p.min_level = Some("shallow".to_string());
        let msg = bad_request(parse_params(p, &defaults(), Los_Angeles));
        assert!(msg.starts_with("Invalid min_level"));
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failure_maps_to_500() {
        let err = AppError::Upstream(NoaaError::Api("down for maintenance".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
