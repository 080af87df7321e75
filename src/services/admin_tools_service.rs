//! Operations behind the `admin-tools` binary.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::profiles_repo::{self, NewProfile};
use crate::database::now_timestamp;
use crate::error::AppResult;
use crate::models::ProfileRow;
use crate::services::auth_service::{self, AuthUser, NewAdminUser};
use crate::services::baas::BaasClient;

pub const ADMIN_NAME: &str = "Admin User";

#[derive(Debug)]
pub struct AdminCheckReport {
    pub auth_user: Option<AuthUser>,
    pub profile: Option<ProfileRow>,
}

impl AdminCheckReport {
    pub fn is_healthy(&self) -> bool {
        match (&self.auth_user, &self.profile) {
            (Some(user), Some(profile)) => user.id == profile.id && profile.is_admin,
            _ => false,
        }
    }
}

pub async fn check_admin_user(
    pool: &SqlitePool,
    baas: &BaasClient,
    email: &str,
) -> AppResult<AdminCheckReport> {
    let auth_user = auth_service::admin_find_user_by_email(baas, email).await?;
    let profile = match &auth_user {
        Some(user) => profiles_repo::load_profile(pool, &user.id).await?,
        None => profiles_repo::find_profile_by_email(pool, email).await?,
    };
    Ok(AdminCheckReport { auth_user, profile })
}

/// Deletes any existing admin account with this email (profile, then auth
/// user) and recreates it confirmed and flagged as admin.
pub async fn reset_admin_user(
    pool: &SqlitePool,
    baas: &BaasClient,
    email: &str,
    password: &str,
) -> AppResult<AuthUser> {
    let email = email.trim().to_lowercase();

    if let Some(profile) = profiles_repo::find_profile_by_email(pool, &email).await? {
        profiles_repo::delete_profile(pool, &profile.id).await?;
        info!("Deleted profile {}", profile.id);
    }
    if let Some(existing) = auth_service::admin_find_user_by_email(baas, &email).await? {
        profiles_repo::delete_profile(pool, &existing.id).await?;
        auth_service::admin_delete_user(baas, &existing.id).await?;
        info!("Deleted auth user {}", existing.id);
    } else {
        warn!("No auth user found for {}, creating a fresh one", email);
    }

    let user = auth_service::admin_create_user(
        baas,
        NewAdminUser {
            email: &email,
            password,
            name: ADMIN_NAME,
        },
    )
    .await?;

    profiles_repo::upsert_profile(
        pool,
        &NewProfile {
            id: user.id.clone(),
            name: ADMIN_NAME.to_string(),
            email,
            phone: None,
            is_admin: true,
            created_at: now_timestamp(),
        },
    )
    .await?;
    info!("🛡️ Admin user {} ready", user.id);
    Ok(user)
}

#[derive(Debug)]
pub struct LoginReport {
    pub user_id: String,
    pub is_admin: bool,
}

pub async fn test_login(
    pool: &SqlitePool,
    baas: &BaasClient,
    email: &str,
    password: &str,
) -> AppResult<LoginReport> {
    let session = auth_service::sign_in_with_password(baas, email.trim(), password).await?;
    let is_admin = profiles_repo::load_profile(pool, &session.user.id)
        .await?
        .map(|p| p.is_admin)
        .unwrap_or(false);
    Ok(LoginReport {
        user_id: session.user.id,
        is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaasConfig;
    use crate::database::testing::{seed_profile, test_pool};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BaasClient {
        BaasClient::new(
            reqwest::Client::new(),
            BaasConfig {
                url: server.uri(),
                anon_key: "anon-key".into(),
                service_role_key: Some("service-key".into()),
                jwt_secret: "secret".into(),
            },
        )
    }

    #[tokio::test]
    async fn reset_replaces_user_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": "old-admin", "email": "admin@example.com" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/old-admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(body_partial_json(json!({
                "email_confirm": true,
                "app_metadata": { "is_admin": true },
                "user_metadata": { "full_name": "Admin User" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "new-admin",
                "email": "admin@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pool = test_pool().await;
        seed_profile(&pool, "old-admin", "Admin", "2024-01-01T00:00:00.000Z").await;
        sqlx::query("UPDATE profiles SET email = 'admin@example.com' WHERE id = 'old-admin'")
            .execute(&pool)
            .await
            .unwrap();

        let user = reset_admin_user(&pool, &client_for(&server), "Admin@Example.com", "clave-segura")
            .await
            .unwrap();
        assert_eq!(user.id, "new-admin");
        assert!(profiles_repo::load_profile(&pool, "old-admin").await.unwrap().is_none());
        let profile = profiles_repo::load_profile(&pool, "new-admin").await.unwrap().unwrap();
        assert!(profile.is_admin);
        assert_eq!(profile.name, ADMIN_NAME);
    }

    #[tokio::test]
    async fn check_reports_missing_admin_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": "u1", "email": "u1@example.com" }]
            })))
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;

        let report = check_admin_user(&pool, &client_for(&server), "u1@example.com").await.unwrap();
        assert!(report.auth_user.is_some());
        assert!(report.profile.is_some());
        assert!(!report.is_healthy());

        profiles_repo::set_admin(&pool, "u1", true).await.unwrap();
        let report = check_admin_user(&pool, &client_for(&server), "u1@example.com").await.unwrap();
        assert!(report.is_healthy());
    }
}
