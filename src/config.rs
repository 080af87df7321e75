use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://pet_rescue.db";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Connection settings for the hosted auth and storage APIs.
#[derive(Debug, Clone)]
pub struct BaasConfig {
    pub url: String,
    pub anon_key: String,
    /// Server-only key; only the admin tooling needs it.
    pub service_role_key: Option<String>,
    /// HS256 secret the auth API signs session tokens with.
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub baas: BaasConfig,
    pub geocoder_url: String,
    pub tile_url: String,
    pub public_site_url: String,
}

impl AppConfig {
    /// Load configuration from the process environment (after `.env`).
    ///
    /// | Env Var                 | Required | Default                               |
    /// |-------------------------|----------|---------------------------------------|
    /// | `DATABASE_URL`          | no       | `sqlite://pet_rescue.db`              |
    /// | `HOST`                  | no       | `127.0.0.1`                           |
    /// | `PORT`                  | no       | `3000`                                |
    /// | `BAAS_URL`              | **yes**  | --                                    |
    /// | `BAAS_ANON_KEY`         | **yes**  | --                                    |
    /// | `BAAS_JWT_SECRET`       | **yes**  | --                                    |
    /// | `BAAS_SERVICE_ROLE_KEY` | no       | --                                    |
    /// | `GEOCODER_URL`          | no       | `https://nominatim.openstreetmap.org` |
    /// | `TILE_URL`              | no       | OpenStreetMap tile template           |
    /// | `PUBLIC_SITE_URL`       | no       | `http://{HOST}:{PORT}`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host: String = try_load("HOST", "127.0.0.1")?;
        let port: u16 = try_load("PORT", "3000")?;
        let public_site_url = optional("PUBLIC_SITE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Ok(Self {
            database_url: try_load("DATABASE_URL", DEFAULT_DATABASE_URL)?,
            host,
            port,
            baas: BaasConfig {
                url: required("BAAS_URL")?.trim_end_matches('/').to_string(),
                anon_key: required("BAAS_ANON_KEY")?,
                service_role_key: optional("BAAS_SERVICE_ROLE_KEY"),
                jwt_secret: required("BAAS_JWT_SECRET")?,
            },
            geocoder_url: try_load::<String>("GEOCODER_URL", DEFAULT_GEOCODER_URL)?
                .trim_end_matches('/')
                .to_string(),
            tile_url: try_load("TILE_URL", DEFAULT_TILE_URL)?,
            public_site_url: public_site_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
