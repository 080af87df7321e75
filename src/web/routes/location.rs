use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::services::location_service::{GeocodeError, LocationResult};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LocationSearchQuery {
    q: Option<String>,
    limit: Option<usize>,
}

fn geocode_failure(e: GeocodeError) -> StatusCode {
    match e {
        GeocodeError::QueryTooShort | GeocodeError::InvalidCoordinates => StatusCode::BAD_REQUEST,
        other => {
            warn!("📍 Geocoder call failed: {}", other);
            StatusCode::BAD_GATEWAY
        }
    }
}

pub async fn search_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationSearchQuery>,
) -> impl IntoResponse {
    let q = query.q.as_deref().unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    match state.geocoder.search(q, limit).await {
        Ok(results) => (StatusCode::OK, Json(results)),
        Err(e) => (geocode_failure(e), Json(Vec::<LocationResult>::new())),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// `{"result": <location or null>}`; 400 without both coordinates.
pub async fn reverse_location(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Response {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "result": null }))).into_response();
    };
    match state.geocoder.reverse(lat, lon).await {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(e) => (geocode_failure(e), Json(json!({ "result": null }))).into_response(),
    }
}
