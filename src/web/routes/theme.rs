use axum::{
    response::{IntoResponse, Redirect, Response},
    Form,
};
use cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::web::layout::{PageContext, THEME_COOKIE};
use crate::web::middleware::auth::append_cookies;
use crate::web::safe_return_path;

const THEME_COOKIE_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub return_to: Option<String>,
}

/// Flips between light and dark and goes back to the page.
pub async fn toggle_theme(ctx: PageContext, Form(form): Form<ThemeForm>) -> Response {
    let next = if ctx.dark { "light" } else { "dark" };
    let mut c = Cookie::new(THEME_COOKIE, next);
    c.set_path("/");
    c.set_same_site(SameSite::Lax);
    c.set_max_age(cookie::time::Duration::days(THEME_COOKIE_DAYS));

    let target = safe_return_path(form.return_to.as_deref(), "/");
    let mut response = Redirect::to(target).into_response();
    append_cookies(&mut response, &[c]);
    response
}
