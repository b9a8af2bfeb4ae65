//! # NOAA Upstream Access
//!
//! Talks to the two public NOAA endpoints the planner needs: the datagetter
//! for high/low predictions and the MDAPI directory for the station picker
//! on the web form. Responses deserialize into wire-shaped structs and come
//! back as-is; interpreting heights and timestamps stays with the filter.
//!
//! Both calls go through one shared [`reqwest::Client`] with a 30-second
//! timeout. Nothing is cached: every request hits NOAA.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::RawPrediction;

/// High/low predictions endpoint
const DATAGETTER_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Station directory endpoint
const STATIONS_URL: &str = "https://api.tidesandcurrents.noaa.gov/mdapi/prod/webapi/stations.json";

/// Per-request timeout for both endpoints
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while talking to NOAA
#[derive(Error, Debug)]
pub enum NoaaError {
    #[error("network request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream rejected the request: {0}")]
    Api(String),
}

/// One entry of the NOAA station directory, slimmed to what the form needs.
///
/// The directory is lenient about field names across API versions, so the
/// id accepts a couple of aliases and missing fields default to empty.
/// Entries without an id are dropped after parsing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Station {
    #[serde(default, alias = "stationId", alias = "station")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    predictions: Option<Vec<RawPrediction>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    stations: Vec<Station>,
}

/// Build the HTTP client shared by all NOAA calls.
pub fn client() -> Result<reqwest::Client, NoaaError> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("tide-planner/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch hilo predictions for a station over an inclusive date range.
///
/// Heights come back in feet relative to MLLW, timestamps as local
/// standard/daylight wall-clock text.
pub async fn fetch_predictions(
    client: &reqwest::Client,
    station: &str,
    begin: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RawPrediction>, NoaaError> {
    let begin_date = begin.format("%Y%m%d").to_string();
    let end_date = end.format("%Y%m%d").to_string();
    debug!(station, %begin_date, %end_date, "requesting predictions");

    let response = client
        .get(DATAGETTER_URL)
        .query(&[
            ("product", "predictions"),
            ("application", "tide-planner"),
            ("begin_date", begin_date.as_str()),
            ("end_date", end_date.as_str()),
            ("datum", "MLLW"),
            ("station", station),
            ("time_zone", "lst_ldt"),
            ("units", "english"),
            ("interval", "hilo"),
            ("format", "json"),
        ])
        .send()
        .await?
        .error_for_status()?;

    let body: PredictionsResponse = response.json().await?;
    parse_predictions(body)
}

/// Fetch the station directory for the web form's station picker.
pub async fn fetch_stations(client: &reqwest::Client) -> Result<Vec<Station>, NoaaError> {
    debug!("requesting station directory");
    let response = client
        .get(STATIONS_URL)
        .send()
        .await?
        .error_for_status()?;

    let body: StationsResponse = response.json().await?;
    Ok(parse_stations(body))
}

fn parse_predictions(body: PredictionsResponse) -> Result<Vec<RawPrediction>, NoaaError> {
    if let Some(err) = body.error {
        let message = if err.message.is_empty() {
            "unspecified upstream error".to_string()
        } else {
            err.message
        };
        return Err(NoaaError::Api(message));
    }
    body.predictions
        .ok_or_else(|| NoaaError::Api("response carried no predictions".to_string()))
}

fn parse_stations(body: StationsResponse) -> Vec<Station> {
    let mut stations = body.stations;
    stations.retain(|s| !s.id.is_empty());
    stations
}
