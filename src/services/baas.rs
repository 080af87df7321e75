//! Shared HTTP plumbing for the hosted auth and storage APIs.

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::BaasConfig;

#[derive(Debug, Error)]
pub enum BaasError {
    #[error("could not reach {url}: {detail}")]
    Connect { url: String, detail: String },

    #[error("upstream returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("unexpected response from {url}: {detail}")]
    Decode { url: String, detail: String },

    #[error("BAAS_SERVICE_ROLE_KEY is not configured")]
    MissingServiceKey,
}

impl BaasError {
    pub fn status(&self) -> StatusCode {
        match self {
            BaasError::Upstream { status, .. } => *status,
            BaasError::MissingServiceKey => StatusCode::INTERNAL_SERVER_ERROR,
            BaasError::Connect { .. } | BaasError::Decode { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Spanish message for forms, picked by matching the upstream wording.
    pub fn user_message(&self) -> &'static str {
        let BaasError::Upstream { message, .. } = self else {
            return "No se pudo contactar con el servidor. Intenta de nuevo.";
        };
        let lower = message.to_lowercase();
        if lower.contains("already registered") || lower.contains("already exists") {
            "Este email ya está registrado"
        } else if lower.contains("invalid login credentials") {
            "Email o contraseña incorrectos"
        } else if lower.contains("email not confirmed") {
            "Debes confirmar tu email antes de iniciar sesión"
        } else if lower.contains("password") {
            "La contraseña no cumple los requisitos"
        } else if lower.contains("expired") || lower.contains("invalid jwt") {
            "El enlace ha expirado. Solicita uno nuevo."
        } else {
            "Ocurrió un error inesperado. Intenta de nuevo."
        }
    }
}

#[derive(Clone)]
pub struct BaasClient {
    http: reqwest::Client,
    config: BaasConfig,
}

impl BaasClient {
    pub fn new(http: reqwest::Client, config: BaasConfig) -> Self {
        Self { http, config }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path.trim_start_matches('/'))
    }

    /// Request signed with the anon key; `bearer` is the user's access token
    /// when the call acts on behalf of a session.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
    ) -> (String, RequestBuilder) {
        let url = self.endpoint(path);
        let token = bearer.unwrap_or(&self.config.anon_key);
        let req = self
            .http
            .request(method, &url)
            .headers(key_headers(&self.config.anon_key, token));
        (url, req)
    }

    /// Request signed with the service-role key (admin endpoints).
    pub(crate) fn service_request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<(String, RequestBuilder), BaasError> {
        let key = self
            .config
            .service_role_key
            .as_deref()
            .ok_or(BaasError::MissingServiceKey)?;
        let url = self.endpoint(path);
        let req = self
            .http
            .request(method, &url)
            .headers(key_headers(key, key));
        Ok((url, req))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        req: RequestBuilder,
    ) -> Result<T, BaasError> {
        let resp = send_checked(url, req).await?;
        resp.json::<T>().await.map_err(|e| BaasError::Decode {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    pub(crate) async fn send_empty(&self, url: &str, req: RequestBuilder) -> Result<(), BaasError> {
        send_checked(url, req).await.map(|_| ())
    }
}

fn key_headers(apikey: &str, bearer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(apikey) {
        headers.insert("apikey", value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", bearer)) {
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

async fn send_checked(url: &str, req: RequestBuilder) -> Result<reqwest::Response, BaasError> {
    let resp = req.send().await.map_err(|e| BaasError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(BaasError::Upstream {
        status,
        message: extract_error_message(&body),
    })
}

/// Auth and storage errors use different shapes; take the first message-like
/// field, else the raw body.
fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
