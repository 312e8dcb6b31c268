use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::AeroGuardError;
use crate::classify::{self, Persona};
use crate::config::{AeroGuardConfig, MAX_HORIZON_DAYS, MAX_HORIZON_HOURS};
use crate::dashboard::{
    CategorySummary, Clock, DashboardService, DashboardSnapshot, ForecastBundle, PersonaRisk,
    StationSummary,
};
use crate::forecast::ThreadJitter;
use crate::models::{Coordinate, SearchHit};
use crate::provider::AirQualityProvider;

/// Shared, immutable server state
pub struct AppState {
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(provider: Arc<dyn AirQualityProvider>, config: &AeroGuardConfig) -> Self {
        Self {
            dashboard: DashboardService::new(provider, config),
        }
    }
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ApiErrorBody { error: self.1 })).into_response()
    }
}

impl From<AeroGuardError> for ApiError {
    fn from(err: AeroGuardError) -> Self {
        match &err {
            AeroGuardError::Validation { message } => {
                ApiError(StatusCode::BAD_REQUEST, message.clone())
            }
            AeroGuardError::Api { message } => {
                warn!("Provider request failed: {}", message);
                ApiError(StatusCode::BAD_GATEWAY, err.user_message())
            }
            AeroGuardError::Config { .. } => {
                error!("Request failed: {}", err);
                ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(StatusCode::BAD_REQUEST, message.into())
}

fn parse_persona(persona: Option<&str>) -> Result<Persona, ApiError> {
    persona.map_or(Ok(Persona::default()), |name| Ok(name.parse()?))
}

#[derive(Debug, Deserialize)]
pub struct AqiQuery {
    pub lat: f64,
    pub lon: f64,
    pub persona: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lon: f64,
    pub hours: Option<u32>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RiskQuery {
    pub aqi: i64,
    pub persona: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

#[derive(Serialize)]
pub struct StationsResponse {
    pub center: Coordinate,
    pub stations: Vec<StationSummary>,
}

#[derive(Serialize)]
pub struct RiskResponse {
    pub aqi: u32,
    pub category: CategorySummary,
    #[serde(flatten)]
    pub risk: PersonaRisk,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/aqi", get(get_aqi))
        .route("/stations", get(get_stations))
        .route("/forecast", get(get_forecast))
        .route("/risk", get(get_risk))
        .route("/search", get(get_search))
        .with_state(state)
}

async fn get_aqi(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AqiQuery>, QueryRejection>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let Query(query) = query?;
    let center = Coordinate::new(query.lat, query.lon)?;
    let persona = parse_persona(query.persona.as_deref())?;

    let snapshot = state
        .dashboard
        .snapshot(center, persona, Clock::now(), ThreadJitter)
        .await?;
    Ok(Json(snapshot))
}

async fn get_stations(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<StationsResponse>, ApiError> {
    let Query(query) = query?;
    let center = Coordinate::new(query.lat, query.lon)?;

    let stations = state.dashboard.stations(center).await?;
    Ok(Json(StationsResponse { center, stations }))
}

async fn get_forecast(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ForecastBundle>, ApiError> {
    let Query(query) = query?;
    let center = Coordinate::new(query.lat, query.lon)?;

    if query.hours.is_some_and(|h| h == 0 || h > MAX_HORIZON_HOURS) {
        return Err(bad_request(format!(
            "hours must be between 1 and {MAX_HORIZON_HOURS}"
        )));
    }
    if query.days.is_some_and(|d| d == 0 || d > MAX_HORIZON_DAYS) {
        return Err(bad_request(format!(
            "days must be between 1 and {MAX_HORIZON_DAYS}"
        )));
    }

    let bundle = state
        .dashboard
        .forecast(center, query.hours, query.days, Clock::now(), ThreadJitter)
        .await?;
    Ok(Json(bundle))
}

async fn get_risk(
    query: Result<Query<RiskQuery>, QueryRejection>,
) -> Result<Json<RiskResponse>, ApiError> {
    let Query(query) = query?;
    let aqi = u32::try_from(query.aqi).map_err(|_| {
        bad_request(format!(
            "aqi must be a non-negative integer, got {}",
            query.aqi
        ))
    })?;
    let persona = parse_persona(Some(&query.persona))?;

    Ok(Json(RiskResponse {
        aqi,
        category: classify::classify(aqi).into(),
        risk: PersonaRisk::assess(aqi, persona),
    }))
}

async fn get_search(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query?;
    let results = state.dashboard.search(&query.keyword).await?;
    Ok(Json(SearchResponse { results }))
}
