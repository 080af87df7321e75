pub mod layout;
pub mod middleware;
pub mod routes;

use askama::Template;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::Html,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use middleware::auth as auth_middleware;
use routes::{admin, auth, dashboard, home, location, my_pets, pets, profile, theme};

/// Up to five 5 MB photos plus the form fields.
const UPLOAD_BODY_LIMIT: usize = 30 * 1024 * 1024;

pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    Ok(Html(template.render()?))
}

/// Only same-site paths; anything else falls back to `default`.
pub fn safe_return_path<'a>(raw: Option<&'a str>, default: &'a str) -> &'a str {
    raw.map(str::trim)
        .filter(|s| is_local_path(s))
        .unwrap_or(default)
}

/// Browsers read `\` as `/` and drop tabs and newlines, so `/\host` and
/// `/\t/host` are protocol-relative too.
fn is_local_path(s: &str) -> bool {
    s.starts_with('/')
        && !s.starts_with("//")
        && !s.contains("://")
        && !s.contains('\\')
        && !s.chars().any(char::is_control)
}

pub fn with_notice(target: &str, notice: &str) -> String {
    let sep = if target.contains('?') { "&" } else { "?" };
    format!("{}{}notice={}", target, sep, notice)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(home::home_page))
        .route("/pets/:id", get(pets::detail_page))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/register", get(auth::register_page).post(auth::register_submit))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password_submit),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password_submit),
        )
        .route("/theme", post(theme::toggle_theme))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware::optional_auth));

    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/my-pets", get(my_pets::my_pets_page))
        .route("/pets/create", get(pets::create_page).post(pets::create_submit))
        .route("/pets/edit/:id", get(pets::edit_page).post(pets::edit_submit))
        .route("/pets/:id/delete", post(pets::delete_handler))
        .route("/pets/:id/status", post(pets::status_handler))
        .route("/profile", get(profile::profile_page).post(profile::profile_submit))
        .route("/logout", post(auth::logout_handler))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware::require_auth));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard_page))
        .route("/admin/users", get(admin::users_page))
        .route("/admin/users/:id/admin", post(admin::toggle_admin))
        .route("/admin/pets", get(admin::pets_page))
        .route("/admin/pets/:id/status", post(admin::pet_status))
        .route("/admin/pets/:id/delete", post(admin::pet_delete))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware::require_admin));

    let api_routes = Router::new()
        .route("/api/location/search", get(location::search_locations))
        .route("/api/location/reverse", get(location::reverse_location));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(api_routes)
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
