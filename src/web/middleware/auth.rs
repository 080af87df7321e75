use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{info, warn};

use crate::database::profiles_repo;
use crate::services::auth_service::{self, AuthSession};
use crate::services::Actor;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

const REFRESH_COOKIE_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub access_token: String,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor<'_> {
        Actor {
            user_id: &self.id,
            is_admin: self.is_admin,
            access_token: &self.access_token,
        }
    }
}

/// Session attached to every request that went through one of the layers
/// below; `None` for visitors.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["authenticated"]);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn base_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut c = Cookie::new(name, value);
    c.set_path("/");
    c.set_http_only(true);
    c.set_same_site(SameSite::Lax);
    c
}

pub fn session_cookies(session: &AuthSession) -> Vec<Cookie<'static>> {
    let mut access = base_cookie(ACCESS_COOKIE, session.access_token.clone());
    if session.expires_in > 0 {
        access.set_max_age(cookie::time::Duration::seconds(session.expires_in));
    }
    let mut refresh = base_cookie(REFRESH_COOKIE, session.refresh_token.clone());
    refresh.set_max_age(cookie::time::Duration::days(REFRESH_COOKIE_DAYS));
    vec![access, refresh]
}

pub fn cleared_session_cookies() -> Vec<Cookie<'static>> {
    [ACCESS_COOKIE, REFRESH_COOKIE]
        .into_iter()
        .map(|name| {
            let mut c = base_cookie(name, String::new());
            c.make_removal();
            c
        })
        .collect()
}

pub fn append_cookies(response: &mut Response, cookies: &[Cookie<'static>]) {
    for c in cookies {
        match HeaderValue::from_str(&c.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Cookie {} not representable as header: {}", c.name(), e),
        }
    }
}

struct ResolvedSession {
    user: Option<AuthenticatedUser>,
    /// Cookies to send back when the session was refreshed or is dead.
    cookies: Vec<Cookie<'static>>,
}

async fn user_for(state: &AppState, claims: Claims, access_token: String) -> Option<AuthenticatedUser> {
    let profile = match profiles_repo::load_profile(&state.pool, &claims.sub).await {
        Ok(p) => p,
        Err(e) => {
            warn!("Profile lookup failed for {}: {}", claims.sub, e);
            None
        }
    };
    let email = claims.email.unwrap_or_default();
    Some(match profile {
        Some(p) => AuthenticatedUser {
            id: p.id,
            email: p.email,
            name: p.name,
            is_admin: p.is_admin,
            access_token,
        },
        None => AuthenticatedUser {
            id: claims.sub,
            name: email.split('@').next().unwrap_or_default().to_string(),
            email,
            is_admin: false,
            access_token,
        },
    })
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> ResolvedSession {
    let secret = &state.config.baas.jwt_secret;
    let access = read_cookie(headers, ACCESS_COOKIE);
    let refresh = read_cookie(headers, REFRESH_COOKIE);

    let mut expired = access.is_none();
    if let Some(token) = access {
        match verify_access_token(&token, secret) {
            Ok(claims) => {
                return ResolvedSession {
                    user: user_for(state, claims, token).await,
                    cookies: vec![],
                };
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => expired = true,
            Err(e) => warn!("Rejected session token: {}", e),
        }
    }

    let Some(refresh) = refresh.filter(|_| expired) else {
        return ResolvedSession {
            user: None,
            cookies: vec![],
        };
    };
    match auth_service::refresh_session(&state.baas, &refresh).await {
        Ok(session) => match verify_access_token(&session.access_token, secret) {
            Ok(claims) => {
                info!("🔄 Session refreshed for {}", claims.sub);
                let cookies = session_cookies(&session);
                ResolvedSession {
                    user: user_for(state, claims, session.access_token).await,
                    cookies,
                }
            }
            Err(e) => {
                warn!("Refreshed token failed verification: {}", e);
                ResolvedSession {
                    user: None,
                    cookies: cleared_session_cookies(),
                }
            }
        },
        Err(e) => {
            warn!("Session refresh failed: {}", e);
            ResolvedSession {
                user: None,
                cookies: cleared_session_cookies(),
            }
        }
    }
}

fn request_target(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

pub fn login_redirect(target: &str) -> String {
    reqwest::Url::parse_with_params("http://localhost/login", &[("redirectTo", target)])
        .map(|u| format!("{}?{}", u.path(), u.query().unwrap_or_default()))
        .unwrap_or_else(|_| "/login".to_string())
}

fn finish(mut response: Response, cookies: &[Cookie<'static>]) -> Response {
    append_cookies(&mut response, cookies);
    response
}

/// Attaches the session when there is one; never blocks.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    if let Some(user) = &resolved.user {
        request.extensions_mut().insert(user.clone());
    }
    request.extensions_mut().insert(CurrentUser(resolved.user));
    finish(next.run(request).await, &resolved.cookies)
}

/// Visitors are sent to `/login?redirectTo=<path>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    let Some(user) = resolved.user else {
        let target = login_redirect(&request_target(&request));
        return finish(Redirect::to(&target).into_response(), &resolved.cookies);
    };
    request.extensions_mut().insert(user.clone());
    request.extensions_mut().insert(CurrentUser(Some(user)));
    finish(next.run(request).await, &resolved.cookies)
}

/// Visitors go to `/login`, signed-in non-admins to `/`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve_session(&state, request.headers()).await;
    let Some(user) = resolved.user else {
        return finish(Redirect::to("/login").into_response(), &resolved.cookies);
    };
    if !user.is_admin {
        warn!("Non-admin {} tried to open {}", user.id, request.uri().path());
        return finish(Redirect::to("/").into_response(), &resolved.cookies);
    }
    request.extensions_mut().insert(user.clone());
    request.extensions_mut().insert(CurrentUser(Some(user)));
    finish(next.run(request).await, &resolved.cookies)
}
