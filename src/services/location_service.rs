use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

const USER_AGENT: &str = concat!("pet-rescue/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("search query must have at least 2 characters")]
    QueryTooShort,

    #[error("coordinates out of range")]
    InvalidCoordinates,

    #[error("geocoder unreachable: {0}")]
    Unreachable(String),

    #[error("geocoder returned {0}")]
    Status(reqwest::StatusCode),

    #[error("geocoder response could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LocationResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    place_id: Option<i64>,
    name: Option<String>,
    display_name: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    error: Option<String>,
}

impl Place {
    fn into_result(self) -> Option<LocationResult> {
        let latitude = self.lat.as_deref()?.trim().parse::<f64>().ok()?;
        let longitude = self.lon.as_deref()?.trim().parse::<f64>().ok()?;
        let description = self.display_name.unwrap_or_default();
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| description.split(',').next().map(|s| s.trim().to_string()))
            .unwrap_or_default();

        Some(LocationResult {
            id: self.place_id.map(|id| id.to_string()).unwrap_or_default(),
            name,
            description,
            latitude,
            longitude,
        })
    }
}

#[derive(Clone)]
pub struct GeocoderClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocoderClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, q: &str, limit: usize) -> Result<Vec<LocationResult>, GeocodeError> {
        let q = q.trim();
        if q.chars().count() < 2 {
            return Err(GeocodeError::QueryTooShort);
        }
        let limit = limit.clamp(1, 20);

        let url = format!("{}/search", self.base_url);
        let limit_param = limit.to_string();
        let req = self.http.get(&url).query(&[
            ("format", "json"),
            ("q", q),
            ("limit", limit_param.as_str()),
        ]);
        let places: Vec<Place> = self.fetch(req).await?;

        Ok(places
            .into_iter()
            .filter_map(Place::into_result)
            .take(limit)
            .collect())
    }

    /// Best address for a point; `None` when nothing is there (open sea).
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<LocationResult>, GeocodeError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(GeocodeError::InvalidCoordinates);
        }

        let url = format!("{}/reverse", self.base_url);
        let req = self.http.get(&url).query(&[
            ("format", "json".to_string()),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
        ]);
        let place: Place = self.fetch(req).await?;

        if let Some(reason) = place.error.as_deref() {
            warn!("📍 Reverse geocode found nothing at {},{}: {}", lat, lon, reason);
            return Ok(None);
        }
        Ok(place.into_result())
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GeocodeError> {
        let resp = req
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                warn!("📍 Geocoder unreachable: {}", e);
                GeocodeError::Unreachable(e.to_string())
            })?;

        if !resp.status().is_success() {
            warn!("📍 Geocoder non-OK: {}", resp.status());
            return Err(GeocodeError::Status(resp.status()));
        }

        resp.json::<T>().await.map_err(|e| {
            warn!("📍 Geocoder JSON parse failed: {}", e);
            GeocodeError::Parse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeocoderClient {
        GeocoderClient::new(reqwest::Client::new(), server.uri())
    }

    #[tokio::test]
    async fn search_parses_string_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("format", "json"))
            .and(query_param("q", "Puerta del Sol"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "place_id": 42,
                    "lat": "40.4169",
                    "lon": "-3.7035",
                    "display_name": "Puerta del Sol, Centro, Madrid, España"
                },
                { "place_id": 43, "display_name": "sin coordenadas" }
            ])))
            .mount(&server)
            .await;

        let results = client_for(&server).search("Puerta del Sol", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "42");
        assert_eq!(results[0].name, "Puerta del Sol");
        assert!((results[0].latitude - 40.4169).abs() < 1e-9);
        assert!((results[0].longitude + 3.7035).abs() < 1e-9);
    }

    #[tokio::test]
    async fn short_queries_never_reach_the_geocoder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).search(" a ", 5).await.unwrap_err();
        assert!(matches!(err, GeocodeError::QueryTooShort));
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server).search("Madrid", 500).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn reverse_returns_none_when_nothing_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "Unable to geocode" })),
            )
            .mount(&server)
            .await;

        let place = client_for(&server).reverse(10.0, -30.0).await.unwrap();
        assert!(place.is_none());
    }

    #[tokio::test]
    async fn reverse_rejects_out_of_range_points() {
        let server = MockServer::start().await;
        let err = client_for(&server).reverse(91.0, 0.0).await.unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidCoordinates));
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).search("Madrid", 5).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status(s) if s.as_u16() == 503));
    }
}
