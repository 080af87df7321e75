use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::services::pet_form::ImageUpload;
use crate::services::profile_service::{self, ProfileForm, ProfileView};
use crate::state::AppState;
use crate::web::layout::PageContext;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{render, with_notice};

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub profile: ProfileView,
    pub form: ProfileForm,
    pub error: Option<String>,
}

async fn load_view(state: &AppState, user_id: &str) -> AppResult<ProfileView> {
    profile_service::load_profile_view(&state.pool, &state.config.baas.url, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn profile_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Response> {
    let profile = load_view(&state, &user.id).await?;
    let form = ProfileForm {
        name: profile.name.clone(),
        phone: profile.phone.clone(),
    };
    let template = ProfileTemplate {
        ctx,
        profile,
        form,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn profile_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut form = ProfileForm::default();
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Profile form could not be read: {}", e);
        AppError::Validation("No se pudo leer el formulario enviado".to_string())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = String::from_utf8_lossy(&bytes).trim().to_string(),
            "phone" => form.phone = String::from_utf8_lossy(&bytes).trim().to_string(),
            "profile_image" if !file_name.is_empty() && !bytes.is_empty() => {
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    match profile_service::update_profile(&state.pool, &state.baas, user.actor(), &form, image).await {
        Ok(()) => Ok(Redirect::to(&with_notice("/profile", "profile")).into_response()),
        Err(e @ (AppError::Validation(_) | AppError::Baas(_))) => {
            warn!("Profile update for {} rejected: {}", user.id, e);
            let template = ProfileTemplate {
                ctx,
                profile: load_view(&state, &user.id).await?,
                form,
                error: Some(e.public_message()),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => Err(e),
    }
}
