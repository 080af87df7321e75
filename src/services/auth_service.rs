use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::services::baas::{BaasClient, BaasError};

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub app_metadata: Value,
    pub email_confirmed_at: Option<String>,
    pub last_sign_in_at: Option<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> Option<String> {
        ["name", "full_name"]
            .iter()
            .find_map(|key| self.user_metadata.get(*key).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Debug)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    /// Present when the project auto-confirms emails.
    pub session: Option<AuthSession>,
}

pub struct NewAdminUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Deserialize)]
struct AdminUserList {
    #[serde(default)]
    users: Vec<AuthUser>,
}

pub async fn sign_up(
    client: &BaasClient,
    email: &str,
    password: &str,
    name: &str,
) -> Result<SignUpOutcome, BaasError> {
    let (url, req) = client.request(Method::POST, "auth/v1/signup", None);
    let body: Value = client
        .send_json(
            &url,
            req.json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            })),
        )
        .await?;

    // Confirmed projects answer with a session, the others with the bare user.
    if body.get("access_token").is_some() {
        let session: AuthSession = decode(&url, body)?;
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }
    let user_value = body.get("user").cloned().unwrap_or(body);
    Ok(SignUpOutcome {
        user: decode(&url, user_value)?,
        session: None,
    })
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, BaasError> {
    serde_json::from_value(value).map_err(|e| BaasError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

pub async fn sign_in_with_password(
    client: &BaasClient,
    email: &str,
    password: &str,
) -> Result<AuthSession, BaasError> {
    let (url, req) = client.request(Method::POST, "auth/v1/token?grant_type=password", None);
    client
        .send_json(&url, req.json(&json!({ "email": email, "password": password })))
        .await
}

pub async fn refresh_session(
    client: &BaasClient,
    refresh_token: &str,
) -> Result<AuthSession, BaasError> {
    let (url, req) = client.request(
        Method::POST,
        "auth/v1/token?grant_type=refresh_token",
        None,
    );
    client
        .send_json(&url, req.json(&json!({ "refresh_token": refresh_token })))
        .await
}

pub async fn sign_out(client: &BaasClient, access_token: &str) -> Result<(), BaasError> {
    let (url, req) = client.request(Method::POST, "auth/v1/logout", Some(access_token));
    client.send_empty(&url, req).await
}

pub async fn send_password_recovery(
    client: &BaasClient,
    email: &str,
    redirect_to: &str,
) -> Result<(), BaasError> {
    let (url, req) = client.request(Method::POST, "auth/v1/recover", None);
    client
        .send_empty(
            &url,
            req.query(&[("redirect_to", redirect_to)])
                .json(&json!({ "email": email })),
        )
        .await
}

pub async fn update_password(
    client: &BaasClient,
    access_token: &str,
    password: &str,
) -> Result<AuthUser, BaasError> {
    let (url, req) = client.request(Method::PUT, "auth/v1/user", Some(access_token));
    client
        .send_json(&url, req.json(&json!({ "password": password })))
        .await
}

/// Creates a confirmed user flagged as admin in its app metadata.
pub async fn admin_create_user(
    client: &BaasClient,
    user: NewAdminUser<'_>,
) -> Result<AuthUser, BaasError> {
    let (url, req) = client.service_request(Method::POST, "auth/v1/admin/users")?;
    let created: AuthUser = client
        .send_json(
            &url,
            req.json(&json!({
                "email": user.email,
                "password": user.password,
                "email_confirm": true,
                "user_metadata": { "full_name": user.name, "name": user.name },
                "app_metadata": { "is_admin": true },
            })),
        )
        .await?;
    info!("🔐 Created auth user {}", created.id);
    Ok(created)
}

pub async fn admin_delete_user(client: &BaasClient, user_id: &str) -> Result<(), BaasError> {
    let path = format!("auth/v1/admin/users/{}", user_id);
    let (url, req) = client.service_request(Method::DELETE, &path)?;
    client.send_empty(&url, req).await
}

pub async fn admin_find_user_by_email(
    client: &BaasClient,
    email: &str,
) -> Result<Option<AuthUser>, BaasError> {
    let (url, req) = client.service_request(Method::GET, "auth/v1/admin/users")?;
    let list: AdminUserList = client
        .send_json(&url, req.query(&[("page", "1"), ("per_page", "1000")]))
        .await?;
    let email = email.trim().to_lowercase();
    Ok(list.users.into_iter().find(|u| {
        u.email
            .as_deref()
            .map(|e| e.trim().to_lowercase() == email)
            .unwrap_or(false)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaasConfig;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
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

    fn session_json() -> Value {
        json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "ana@example.com", "user_metadata": { "name": "Ana" } }
        })
    }

    #[tokio::test]
    async fn sign_in_sends_apikey_and_parses_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(json!({ "email": "ana@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
            .expect(1)
            .mount(&server)
            .await;

        let session = sign_in_with_password(&client_for(&server), "ana@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(session.access_token, "access");
        assert_eq!(session.user.id, "user-1");
        assert_eq!(session.user.display_name().as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn sign_in_failure_keeps_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = sign_in_with_password(&client_for(&server), "ana@example.com", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Email o contraseña incorrectos");
    }

    #[tokio::test]
    async fn sign_up_without_confirmation_returns_bare_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "data": { "name": "Ana" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "ana@example.com"
            })))
            .mount(&server)
            .await;

        let outcome = sign_up(&client_for(&server), "ana@example.com", "secret1", "Ana")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, "user-2");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn sign_up_reads_user_nested_under_user_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": { "id": "user-3", "email": "leo@example.com" }
            })))
            .mount(&server)
            .await;

        let outcome = sign_up(&client_for(&server), "leo@example.com", "secret1", "Leo")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, "user-3");
        assert_eq!(outcome.user.email.as_deref(), Some("leo@example.com"));
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn sign_up_with_autoconfirm_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
            .mount(&server)
            .await;

        let outcome = sign_up(&client_for(&server), "ana@example.com", "secret1", "Ana")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, "user-1");
        assert_eq!(outcome.session.map(|s| s.refresh_token).as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn admin_lookup_uses_service_key_and_matches_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [
                    { "id": "a", "email": "other@example.com" },
                    { "id": "b", "email": "Admin@Example.com" }
                ]
            })))
            .mount(&server)
            .await;

        let found = admin_find_user_by_email(&client_for(&server), "admin@example.com")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id).as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn admin_calls_require_service_key() {
        let server = MockServer::start().await;
        let client = BaasClient::new(
            reqwest::Client::new(),
            BaasConfig {
                url: server.uri(),
                anon_key: "anon-key".into(),
                service_role_key: None,
                jwt_secret: "secret".into(),
            },
        );
        let err = admin_delete_user(&client, "user-1").await.unwrap_err();
        assert!(matches!(err, BaasError::MissingServiceKey));
    }
}
