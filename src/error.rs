use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::baas::BaasError;
use crate::services::location_service::GeocodeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("upstream error: {0}")]
    Baas(#[from] BaasError),

    #[error("geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("{0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Baas(e) if e.status().is_client_error() => e.status(),
            AppError::Baas(_) | AppError::Geocode(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// What the page shows. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(message) => message.clone(),
            AppError::Baas(e) => e.user_message().to_string(),
            AppError::NotFound => "La página que buscas no existe.".to_string(),
            AppError::Forbidden => "No tienes permiso para realizar esta acción.".to_string(),
            AppError::Unauthorized => "Debes iniciar sesión para continuar.".to_string(),
            AppError::Geocode(_) => "El servicio de ubicación no está disponible.".to_string(),
            AppError::Database(_) | AppError::Render(_) => {
                "Ha ocurrido un error inesperado. Inténtalo de nuevo más tarde.".to_string()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("⚠️ {}", self);
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.public_message(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!("❌ Error page failed to render: {}", e);
                (status, self.public_message()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_variant() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let upstream = AppError::Baas(BaasError::Upstream {
            status: StatusCode::BAD_REQUEST,
            message: "User already registered".into(),
        });
        assert_eq!(upstream.status(), StatusCode::BAD_REQUEST);
        assert_eq!(upstream.public_message(), "Este email ya está registrado");
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("row"));
    }
}
