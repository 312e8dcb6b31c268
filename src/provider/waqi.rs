use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{AirQualityProvider, ProviderResult};
use crate::config::{ProviderConfig, TOKEN_ENV_VAR};
use crate::error::ProviderFailure;
use crate::models::{
    Coordinate, DailyForecastEntry, Pollutants, SearchHit, SearchStation, StationFeed,
    StationReading,
};
use crate::{AeroGuardError, Result};

const UNKNOWN_STATION: &str = "Unknown Station";

/// World Air Quality Index (aqicn.org) API client
pub struct WaqiClient {
    client: Client,
    token: String,
    base_url: String,
}

/// Top-level response wrapper: `{"status": "ok" | "error", "data": ...}`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct FeedData {
    pub idx: u64,
    /// Number, or `"-"` for stations without a current value
    pub aqi: Value,
    #[serde(default)]
    pub city: Option<FeedCity>,
    #[serde(default)]
    pub dominentpol: Option<String>,
    #[serde(default)]
    pub iaqi: HashMap<String, IaqiValue>,
    #[serde(default)]
    pub time: Option<FeedTime>,
    #[serde(default)]
    pub forecast: Option<FeedForecast>,
}

#[derive(Debug, Deserialize)]
pub struct FeedCity {
    pub name: Option<String>,
    pub geo: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct IaqiValue {
    pub v: f64,
}

#[derive(Debug, Deserialize)]
pub struct FeedTime {
    pub s: Option<String>,
    pub tz: Option<String>,
    pub iso: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedForecast {
    #[serde(default)]
    pub daily: HashMap<String, Vec<FeedDailyEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct FeedDailyEntry {
    pub day: String,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchEntry {
    pub uid: u64,
    pub aqi: Value,
    #[serde(default)]
    pub time: Option<SearchTime>,
    pub station: SearchEntryStation,
}

#[derive(Debug, Deserialize)]
pub struct SearchTime {
    pub stime: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchEntryStation {
    pub name: String,
    pub geo: Vec<f64>,
}

impl WaqiClient {
    /// Create a new client. The token must be present in `config`.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AeroGuardError::config(format!(
                    "AQICN API token not configured. Set AEROGUARD_PROVIDER__TOKEN or {TOKEN_ENV_VAR}."
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("AeroGuard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AeroGuardError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn feed_url(&self, point: Coordinate) -> String {
        format!(
            "{}/feed/{}/?token={}",
            self.base_url,
            point.geo_key(),
            urlencoding::encode(&self.token)
        )
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "{}/search/?token={}&keyword={}",
            self.base_url,
            urlencoding::encode(&self.token),
            urlencoding::encode(keyword)
        )
    }

    /// GET a url and unwrap the `ok` envelope
    async fn fetch_data(&self, url: &str) -> ProviderResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderFailure::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderFailure::HttpStatus(response.status().as_u16()));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ProviderFailure::Parse(format!("Failed to parse WAQI response: {e}")))?;

        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl AirQualityProvider for WaqiClient {
    #[instrument(skip(self), fields(key = %point.geo_key()))]
    async fn query_nearest(&self, point: Coordinate) -> ProviderResult<StationReading> {
        self.feed(point).await.map(|feed| feed.reading)
    }

    #[instrument(skip(self), fields(key = %point.geo_key()))]
    async fn feed(&self, point: Coordinate) -> ProviderResult<StationFeed> {
        debug!("Requesting station feed");
        let data = self.fetch_data(&self.feed_url(point)).await?;
        feed_from_data(data, point)
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str) -> ProviderResult<Vec<SearchHit>> {
        debug!("Searching stations");
        let data = self.fetch_data(&self.search_url(keyword)).await?;
        search_hits_from_data(data)
    }
}

/// Anything but `status == "ok"` with a payload is a failure
pub fn unwrap_envelope(envelope: Envelope) -> ProviderResult<Value> {
    if envelope.status != "ok" {
        let message = envelope
            .data
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or("Invalid API response")
            .to_string();
        return Err(ProviderFailure::Status {
            status: envelope.status,
            message,
        });
    }
    envelope
        .data
        .ok_or_else(|| ProviderFailure::Parse("Response has no data".to_string()))
}

/// Convert a feed payload; `query_point` stands in for a missing station position
pub fn feed_from_data(data: Value, query_point: Coordinate) -> ProviderResult<StationFeed> {
    let data: FeedData = serde_json::from_value(data)
        .map_err(|e| ProviderFailure::Parse(format!("Unexpected feed payload: {e}")))?;

    let aqi = parse_aqi(&data.aqi).ok_or(ProviderFailure::NoReading)?;

    let (name, coordinate) = match data.city {
        Some(city) => (
            city.name.filter(|name| !name.is_empty()),
            city.geo.as_deref().and_then(coordinate_from_geo),
        ),
        None => (None, None),
    };

    let reading = StationReading {
        id: data.idx,
        name: name.unwrap_or_else(|| UNKNOWN_STATION.to_string()),
        coordinate: coordinate.unwrap_or(query_point),
        aqi,
        observed_at: data
            .time
            .as_ref()
            .and_then(parse_observed_at)
            .unwrap_or_else(Utc::now),
    };

    let pollutant = |key: &str| data.iaqi.get(key).map(|value| value.v);
    let pollutants = Pollutants {
        pm25: pollutant("pm25"),
        pm10: pollutant("pm10"),
        no2: pollutant("no2"),
        co: pollutant("co"),
        o3: pollutant("o3"),
        so2: pollutant("so2"),
    };

    let daily_pm25 = data
        .forecast
        .and_then(|mut forecast| forecast.daily.remove("pm25"))
        .unwrap_or_default()
        .into_iter()
        .map(|entry| DailyForecastEntry {
            day: entry.day,
            avg: non_negative(entry.avg),
            min: non_negative(entry.min),
            max: non_negative(entry.max),
        })
        .collect();

    Ok(StationFeed {
        reading,
        pollutants,
        dominant_pollutant: data.dominentpol.filter(|p| !p.is_empty()),
        daily_pm25,
    })
}

pub fn search_hits_from_data(data: Value) -> ProviderResult<Vec<SearchHit>> {
    let entries: Vec<SearchEntry> = serde_json::from_value(data)
        .map_err(|e| ProviderFailure::Parse(format!("Unexpected search payload: {e}")))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let coordinate = coordinate_from_geo(&entry.station.geo)?;
            Some(SearchHit {
                id: entry.uid,
                aqi: parse_aqi(&entry.aqi),
                observed_at: entry.time.and_then(|time| time.stime),
                station: SearchStation {
                    name: entry.station.name,
                    coordinate,
                },
            })
        })
        .collect())
}

/// AQI arrives as a number or a numeric string; `"-"` means no reading
fn parse_aqi(value: &Value) -> Option<u32> {
    let aqi = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (aqi.is_finite() && aqi >= 0.0).then(|| aqi.round() as u32)
}

fn coordinate_from_geo(geo: &[f64]) -> Option<Coordinate> {
    match geo {
        [lat, lon, ..] => Coordinate::new(*lat, *lon).ok(),
        _ => None,
    }
}

fn parse_observed_at(time: &FeedTime) -> Option<DateTime<Utc>> {
    if let Some(iso) = &time.iso {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(iso) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    let local = time.s.as_deref()?;
    let tz = time.tz.as_deref().unwrap_or("+00:00");
    DateTime::parse_from_str(&format!("{local} {tz}"), "%Y-%m-%d %H:%M:%S %:z")
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn non_negative(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use chrono::TimeZone;
    use serde_json::json;

    fn query_point() -> Coordinate {
        Coordinate::new(19.11, 72.93).unwrap()
    }

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_feed_conversion() {
        let data = unwrap_envelope(envelope(json!({
            "status": "ok",
            "data": {
                "aqi": 80,
                "idx": 1,
                "city": { "geo": [19.1, 72.9], "name": "Powai, Mumbai" },
                "dominentpol": "pm25",
                "iaqi": { "pm25": { "v": 80 }, "pm10": { "v": 54 }, "no2": { "v": 12.5 } },
                "time": { "s": "2024-11-04 12:00:00", "tz": "+05:30", "iso": "2024-11-04T12:00:00+05:30" },
                "forecast": { "daily": { "pm25": [
                    { "avg": 88, "day": "2024-11-04", "max": 110, "min": 70 },
                    { "avg": 91, "day": "2024-11-05", "max": 120, "min": 75 }
                ] } }
            }
        })))
        .unwrap();

        let feed = feed_from_data(data, query_point()).unwrap();
        assert_eq!(feed.reading.id, 1);
        assert_eq!(feed.reading.aqi, 80);
        assert_eq!(feed.reading.name, "Powai, Mumbai");
        assert_eq!(feed.reading.coordinate, Coordinate { lat: 19.1, lon: 72.9 });
        assert_eq!(
            feed.reading.observed_at,
            Utc.with_ymd_and_hms(2024, 11, 4, 6, 30, 0).unwrap()
        );
        assert_eq!(feed.pollutants.pm25, Some(80.0));
        assert_eq!(feed.pollutants.no2, Some(12.5));
        assert_eq!(feed.pollutants.o3, None);
        assert_eq!(feed.dominant_pollutant.as_deref(), Some("pm25"));
        assert_eq!(feed.daily_pm25.len(), 2);
        assert_eq!(feed.daily_pm25[1].max, 120);
    }

    #[test]
    fn test_sparse_feed_uses_fallbacks() {
        let before = Utc::now();
        let feed = feed_from_data(json!({ "aqi": "57", "idx": 42 }), query_point()).unwrap();
        assert_eq!(feed.reading.aqi, 57);
        assert_eq!(feed.reading.name, "Unknown Station");
        assert_eq!(feed.reading.coordinate, query_point());
        assert!(feed.reading.observed_at >= before);
        assert!(feed.daily_pm25.is_empty());
    }

    #[test]
    fn test_time_without_iso_uses_offset() {
        let feed = feed_from_data(
            json!({ "aqi": 10, "idx": 3, "time": { "s": "2024-11-04 12:00:00", "tz": "+01:00" } }),
            query_point(),
        )
        .unwrap();
        assert_eq!(
            feed.reading.observed_at,
            Utc.with_ymd_and_hms(2024, 11, 4, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_dash_aqi_is_no_reading() {
        let result = feed_from_data(json!({ "aqi": "-", "idx": 9 }), query_point());
        assert_eq!(result.unwrap_err(), ProviderFailure::NoReading);
    }

    #[test]
    fn test_error_status_is_failure() {
        let result = unwrap_envelope(envelope(json!({ "status": "error", "data": "Invalid key" })));
        assert_eq!(
            result.unwrap_err(),
            ProviderFailure::Status {
                status: "error".to_string(),
                message: "Invalid key".to_string()
            }
        );

        let result = unwrap_envelope(envelope(json!({ "status": "nope" })));
        assert!(matches!(result, Err(ProviderFailure::Status { .. })));

        let result = unwrap_envelope(envelope(json!({ "status": "ok" })));
        assert!(matches!(result, Err(ProviderFailure::Parse(_))));
    }

    #[test]
    fn test_malformed_payload_is_parse_failure() {
        let result = feed_from_data(json!({ "aqi": 10 }), query_point());
        assert!(matches!(result, Err(ProviderFailure::Parse(_))));
    }

    #[test]
    fn test_search_hits() {
        let hits = search_hits_from_data(json!([
            {
                "uid": 12,
                "aqi": "64",
                "time": { "stime": "2024-11-04 12:00:00" },
                "station": { "name": "Bandra, Mumbai", "geo": [19.06, 72.84] }
            },
            {
                "uid": 13,
                "aqi": "-",
                "station": { "name": "Offline", "geo": [19.0, 72.8] }
            },
            {
                "uid": 14,
                "aqi": "20",
                "station": { "name": "Broken geo", "geo": [] }
            }
        ]))
        .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 12);
        assert_eq!(hits[0].aqi, Some(64));
        assert_eq!(hits[0].observed_at.as_deref(), Some("2024-11-04 12:00:00"));
        assert_eq!(hits[0].station.coordinate, Coordinate { lat: 19.06, lon: 72.84 });
        assert_eq!(hits[1].aqi, None);
    }

    #[test]
    fn test_client_requires_token() {
        let mut config = ProviderConfig::default();
        let err = WaqiClient::new(&config).err().unwrap();
        assert!(matches!(err, AeroGuardError::Config { .. }));
        assert!(err.to_string().contains(TOKEN_ENV_VAR));

        config.token = Some("   ".to_string());
        assert!(WaqiClient::new(&config).is_err());
    }

    #[test]
    fn test_urls() {
        let config = ProviderConfig {
            token: Some("secret token".to_string()),
            base_url: "https://api.waqi.info/".to_string(),
            timeout_seconds: 5,
        };
        let client = WaqiClient::new(&config).unwrap();
        assert_eq!(
            client.feed_url(query_point()),
            "https://api.waqi.info/feed/geo:19.11;72.93/?token=secret%20token"
        );
        assert_eq!(
            client.search_url("navi mumbai"),
            "https://api.waqi.info/search/?token=secret%20token&keyword=navi%20mumbai"
        );
    }

    /// Serve `app` on an ephemeral local port and return its base url
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn local_client(base_url: String) -> WaqiClient {
        WaqiClient::new(&ProviderConfig {
            token: Some("demo".to_string()),
            base_url,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_failure() {
        let app = Router::new().route(
            "/feed/{*rest}",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let client = local_client(serve(app).await);

        let result = client.query_nearest(query_point()).await;
        assert_eq!(result, Err(ProviderFailure::HttpStatus(503)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_a_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = local_client(format!("http://{addr}"));

        let result = client.query_nearest(query_point()).await;
        assert!(matches!(result, Err(ProviderFailure::Network(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_feed_over_http() {
        let feed = json!({
            "status": "ok",
            "data": {
                "aqi": 80,
                "idx": 1,
                "city": { "name": "Powai", "geo": [19.11, 72.93] }
            }
        });
        let rejected = json!({ "status": "error", "data": "Invalid key" });
        let app = Router::new()
            .route("/feed/{*rest}", get(move || async move { Json(feed) }))
            .route("/search/", get(move || async move { Json(rejected) }));
        let client = local_client(serve(app).await);

        let reading = client.query_nearest(query_point()).await.unwrap();
        assert_eq!(reading.id, 1);
        assert_eq!(reading.aqi, 80);
        assert_eq!(reading.name, "Powai");

        let result = client.search("mumbai").await;
        assert_eq!(
            result,
            Err(ProviderFailure::Status {
                status: "error".to_string(),
                message: "Invalid key".to_string(),
            })
        );
    }
}
