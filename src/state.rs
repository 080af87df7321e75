use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::baas::BaasClient;
use crate::services::location_service::GeocoderClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub baas: BaasClient,
    pub geocoder: GeocoderClient,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        // One connection pool for every upstream call.
        let http = reqwest::Client::new();
        let baas = BaasClient::new(http.clone(), config.baas.clone());
        let geocoder = GeocoderClient::new(http, config.geocoder_url.clone());
        Self {
            pool,
            config: Arc::new(config),
            baas,
            geocoder,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
