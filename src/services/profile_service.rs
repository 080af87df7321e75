use std::borrow::Cow;

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::database::profiles_repo;
use crate::error::{AppError, AppResult};
use crate::services::baas::BaasClient;
use crate::services::display;
use crate::services::pet_form::{validate_images, ImageRules, ImageUpload};
use crate::services::storage_service::{self, UploadObject, PROFILE_IMAGES_BUCKET};
use crate::services::Actor;

pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub image_url: Option<String>,
    pub initials: String,
    pub avatar_color: String,
    pub is_admin: bool,
    pub member_since: String,
    pub last_login_label: Option<String>,
}

pub async fn load_profile_view(
    pool: &SqlitePool,
    baas_url: &str,
    user_id: &str,
) -> sqlx::Result<Option<ProfileView>> {
    let Some(row) = profiles_repo::load_profile(pool, user_id).await? else {
        return Ok(None);
    };

    let image_url = row
        .profile_image
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| storage_service::public_url(baas_url, PROFILE_IMAGES_BUCKET, Some(p)));
    let label_source = if row.name.trim().is_empty() { &row.email } else { &row.name };

    Ok(Some(ProfileView {
        initials: display::initials(label_source),
        avatar_color: display::string_to_color(label_source),
        member_since: display::format_date(&row.created_at),
        last_login_label: row
            .last_login
            .as_deref()
            .map(|at| display::time_ago(at, Utc::now())),
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone.unwrap_or_default(),
        image_url,
        is_admin: row.is_admin,
    }))
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    #[serde(default)]
    pub phone: String,
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < 2 {
        return Err(ValidationError::new("name_short")
            .with_message(Cow::Borrowed("El nombre debe tener al menos 2 caracteres")));
    }
    Ok(())
}

/// Empty, or 8 to 15 of: digits, spaces, `+`, `-`, `(`, `)`.
fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let len = value.chars().count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if !allowed || !(8..=15).contains(&len) {
        return Err(ValidationError::new("phone")
            .with_message(Cow::Borrowed("Introduce un número de teléfono válido")));
    }
    Ok(())
}

impl ProfileForm {
    pub fn first_error(&self) -> Option<String> {
        let errors = self.validate().err()?;
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Datos no válidos".to_string());
        Some(message)
    }
}

/// Saves name and phone; a new photo replaces the stored one.
pub async fn update_profile(
    pool: &SqlitePool,
    baas: &BaasClient,
    actor: Actor<'_>,
    form: &ProfileForm,
    image: Option<ImageUpload>,
) -> AppResult<()> {
    if let Some(message) = form.first_error() {
        return Err(AppError::Validation(message));
    }
    let current = profiles_repo::load_profile(pool, actor.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_image = match image {
        Some(image) => {
            validate_images(std::slice::from_ref(&image), ImageRules::EDIT)
                .map_err(AppError::Validation)?;
            let ext = image.extension().unwrap_or_else(|| "jpg".to_string());
            let path = format!("{}/{}.{}", actor.user_id, Utc::now().timestamp_millis(), ext);
            let content_type = if image.content_type.starts_with("image/") {
                image.content_type.clone()
            } else {
                format!("image/{}", if ext == "jpg" { "jpeg" } else { ext.as_str() })
            };
            let stored = storage_service::upload_object(
                baas,
                actor.access_token,
                PROFILE_IMAGES_BUCKET,
                UploadObject {
                    path: &path,
                    bytes: image.bytes,
                    content_type: &content_type,
                },
            )
            .await?;
            Some(stored)
        }
        None => None,
    };

    let phone = Some(form.phone.trim()).filter(|p| !p.is_empty());
    profiles_repo::update_profile(pool, actor.user_id, form.name.trim(), phone, new_image.as_deref())
        .await?;

    if let (Some(_), Some(old)) = (&new_image, current.profile_image.filter(|p| !p.trim().is_empty())) {
        if let Err(e) = storage_service::remove_objects(baas, actor.access_token, PROFILE_IMAGES_BUCKET, &[old.clone()]).await {
            warn!("Old profile image {} could not be removed: {}", old, e);
        }
    }
    info!("👤 Profile {} updated", actor.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaasConfig;
    use crate::database::testing::{seed_profile, test_pool};
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BaasClient {
        BaasClient::new(
            reqwest::Client::new(),
            BaasConfig {
                url: server.uri(),
                anon_key: "anon-key".into(),
                service_role_key: None,
                jwt_secret: "secret".into(),
            },
        )
    }

    fn actor() -> Actor<'static> {
        Actor {
            user_id: "u1",
            is_admin: false,
            access_token: "token",
        }
    }

    #[test]
    fn phone_rules() {
        let form = |phone: &str| ProfileForm {
            name: "Ana".into(),
            phone: phone.into(),
        };
        assert!(form("").first_error().is_none());
        assert!(form("+34 600 123 456").first_error().is_none());
        assert!(form("(91) 555-1234").first_error().is_none());
        assert!(form("1234567").first_error().is_some());
        assert!(form("1234567890123456").first_error().is_some());
        assert!(form("600-abc-123").first_error().is_some());
    }

    #[test]
    fn name_needs_two_characters() {
        let form = ProfileForm {
            name: " A ".into(),
            phone: String::new(),
        };
        assert_eq!(
            form.first_error().as_deref(),
            Some("El nombre debe tener al menos 2 caracteres")
        );
    }

    #[tokio::test]
    async fn view_builds_initials_and_color() {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "ana lópez", "2024-05-01T10:00:00.000Z").await;
        let view = load_profile_view(&pool, "http://baas", "u1").await.unwrap().unwrap();
        assert_eq!(view.initials, "AL");
        assert_eq!(view.avatar_color, display::string_to_color("ana lópez"));
        assert_eq!(view.member_since, "1 de mayo de 2024");
        assert!(view.image_url.is_none());
        assert!(load_profile_view(&pool, "http://baas", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_photo_and_removes_old_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/profile-images/u1/\d+\.png$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/profile-images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-05-01T10:00:00.000Z").await;
        let baas = client_for(&server);
        let form = ProfileForm {
            name: "Ana María".into(),
            phone: "600123456".into(),
        };
        let png = || ImageUpload {
            file_name: "me.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };

        // First photo: nothing to remove yet.
        update_profile(&pool, &baas, actor(), &form, Some(png())).await.unwrap();
        update_profile(&pool, &baas, actor(), &form, Some(png())).await.unwrap();

        let row = profiles_repo::load_profile(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(row.name, "Ana María");
        assert_eq!(row.phone.as_deref(), Some("600123456"));
        assert!(row.profile_image.unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_before_storage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-05-01T10:00:00.000Z").await;
        let form = ProfileForm {
            name: "A".into(),
            phone: String::new(),
        };
        let result = update_profile(&pool, &client_for(&server), actor(), &form, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
