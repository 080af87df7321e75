//! Sign-up, sign-in and password recovery on top of the auth API.

use std::borrow::Cow;

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::database::profiles_repo::{self, NewProfile};
use crate::database::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::ProfileRow;
use crate::services::auth_service::{self, AuthSession};
use crate::services::baas::BaasClient;

pub const RESET_FAILED_MESSAGE: &str =
    "No se pudo actualizar la contraseña. Es posible que el enlace haya expirado.";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(custom(function = "validate_required_name"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "El email es requerido"),
        email(message = "El email no es válido")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Las contraseñas no coinciden"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(
        length(min = 1, message = "El email es requerido"),
        email(message = "El email no es válido")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es requerida"))]
    pub password: String,
    #[serde(default, rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ForgotPasswordForm {
    #[validate(
        length(min = 1, message = "El email es requerido"),
        email(message = "El email no es válido")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResetPasswordForm {
    /// Recovery token copied from the link fragment by the page script.
    #[serde(default)]
    pub access_token: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Las contraseñas no coinciden"))]
    pub confirm_password: String,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_required_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("name_required", "El nombre es requerido"));
    }
    Ok(())
}

/// First failing field, in the order given.
fn check<T: Validate>(form: &T, order: &[&str]) -> AppResult<()> {
    let Err(errors) = form.validate() else {
        return Ok(());
    };
    let field_errors = errors.field_errors();
    let message = order
        .iter()
        .filter_map(|field| {
            field_errors
                .iter()
                .find(|(name, _)| name.to_string() == *field)
                .and_then(|(_, errs)| errs.first())
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
        })
        .next()
        .unwrap_or_else(|| "Datos no válidos".to_string());
    Err(AppError::Validation(message))
}

pub fn validate_register(form: &RegisterForm) -> AppResult<()> {
    check(form, &["name", "email", "password", "confirm_password"])
}

pub struct RegisterOutcome {
    pub user_id: String,
    /// Present when no email confirmation is required.
    pub session: Option<AuthSession>,
}

pub async fn register(
    pool: &SqlitePool,
    baas: &BaasClient,
    form: &RegisterForm,
) -> AppResult<RegisterOutcome> {
    validate_register(form)?;
    let email = form.email.trim().to_lowercase();
    let name = form.name.trim();

    let outcome = auth_service::sign_up(baas, &email, &form.password, name).await?;
    profiles_repo::upsert_profile(
        pool,
        &NewProfile {
            id: outcome.user.id.clone(),
            name: name.to_string(),
            email,
            phone: None,
            is_admin: false,
            created_at: now_timestamp(),
        },
    )
    .await?;
    info!("👤 Registered user {}", outcome.user.id);

    Ok(RegisterOutcome {
        user_id: outcome.user.id,
        session: outcome.session,
    })
}

pub struct LoginOutcome {
    pub session: AuthSession,
    pub profile: ProfileRow,
}

/// Signs in, makes sure a profile row exists and stamps `last_login`.
pub async fn login(pool: &SqlitePool, baas: &BaasClient, form: &LoginForm) -> AppResult<LoginOutcome> {
    check(form, &["email", "password"])?;
    let email = form.email.trim().to_lowercase();
    let session = auth_service::sign_in_with_password(baas, &email, &form.password).await?;
    let user = &session.user;

    let name = user
        .display_name()
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let profile_email = user.email.clone().unwrap_or_else(|| email.clone());
    if profiles_repo::insert_profile_if_missing(pool, &user.id, &name, &profile_email, &now_timestamp()).await? {
        warn!("Profile for {} was missing and has been created at login", user.id);
    }
    profiles_repo::touch_last_login(pool, &user.id, &now_timestamp()).await?;

    let profile = profiles_repo::load_profile(pool, &user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!("🔓 User {} signed in", user.id);
    Ok(LoginOutcome { session, profile })
}

pub async fn forgot_password(
    baas: &BaasClient,
    public_site_url: &str,
    form: &ForgotPasswordForm,
) -> AppResult<()> {
    check(form, &["email"])?;
    let redirect_to = format!("{}/reset-password", public_site_url.trim_end_matches('/'));
    auth_service::send_password_recovery(baas, form.email.trim(), &redirect_to).await?;
    info!("✉️ Password recovery requested");
    Ok(())
}

pub async fn reset_password(baas: &BaasClient, form: &ResetPasswordForm) -> AppResult<()> {
    check(form, &["password", "confirm_password"])?;
    let token = form.access_token.trim();
    if token.is_empty() {
        return Err(AppError::Validation(RESET_FAILED_MESSAGE.to_string()));
    }
    match auth_service::update_password(baas, token, &form.password).await {
        Ok(user) => {
            info!("🔑 Password updated for {}", user.id);
            Ok(())
        }
        Err(e) => {
            warn!("Password reset failed: {}", e);
            Err(AppError::Validation(RESET_FAILED_MESSAGE.to_string()))
        }
    }
}
