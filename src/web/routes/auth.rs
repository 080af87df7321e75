use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::services::account_service::{
    self, ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm,
};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::layout::{notice_for, PageContext};
use crate::web::middleware::auth::{
    append_cookies, cleared_session_cookies, session_cookies, AuthenticatedUser, CurrentUser,
};
use crate::web::{render, safe_return_path, with_notice};

const AFTER_LOGIN: &str = "/dashboard";

#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Errors the user can fix by editing the form; everything else is a page.
fn form_error(e: AppError) -> AppResult<String> {
    match e {
        AppError::Validation(_) | AppError::Baas(_) => {
            warn!("Account form rejected: {}", e);
            Ok(e.public_message())
        }
        other => Err(other),
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub redirect_to: String,
    pub error: Option<String>,
}

pub async fn login_page(
    ctx: PageContext,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<RedirectQuery>,
) -> AppResult<Response> {
    let redirect_to = safe_return_path(query.redirect_to.as_deref(), AFTER_LOGIN).to_string();
    if current.0.is_some() {
        return Ok(Redirect::to(&redirect_to).into_response());
    }
    let template = LoginTemplate {
        ctx,
        email: String::new(),
        redirect_to,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn login_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let redirect_to = safe_return_path(form.redirect_to.as_deref(), AFTER_LOGIN).to_string();
    match account_service::login(&state.pool, &state.baas, &form).await {
        Ok(outcome) => {
            let mut response = Redirect::to(&redirect_to).into_response();
            append_cookies(&mut response, &session_cookies(&outcome.session));
            Ok(response)
        }
        Err(e) => {
            let template = LoginTemplate {
                ctx,
                email: form.email,
                redirect_to,
                error: Some(form_error(e)?),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

pub async fn register_page(
    ctx: PageContext,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<RedirectQuery>,
) -> AppResult<Response> {
    if current.0.is_some() {
        let target = safe_return_path(query.redirect_to.as_deref(), AFTER_LOGIN);
        return Ok(Redirect::to(target).into_response());
    }
    let template = RegisterTemplate {
        ctx,
        name: String::new(),
        email: String::new(),
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn register_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    match account_service::register(&state.pool, &state.baas, &form).await {
        // Confirmation disabled upstream: the user is signed in right away.
        Ok(outcome) => match outcome.session {
            Some(session) => {
                let mut response = Redirect::to(AFTER_LOGIN).into_response();
                append_cookies(&mut response, &session_cookies(&session));
                Ok(response)
            }
            None => Ok(Redirect::to(&with_notice("/login", "registered")).into_response()),
        },
        Err(e) => {
            let template = RegisterTemplate {
                ctx,
                name: form.name,
                email: form.email,
                error: Some(form_error(e)?),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub sent: bool,
    pub error: Option<String>,
}

pub async fn forgot_password_page(ctx: PageContext) -> AppResult<Response> {
    let template = ForgotPasswordTemplate {
        ctx,
        email: String::new(),
        sent: false,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn forgot_password_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> AppResult<Response> {
    let template = match account_service::forgot_password(
        &state.baas,
        &state.config.public_site_url,
        &form,
    )
    .await
    {
        Ok(()) => ForgotPasswordTemplate {
            ctx: ctx.with_notice(notice_for("recovery")),
            email: String::new(),
            sent: true,
            error: None,
        },
        Err(e) => ForgotPasswordTemplate {
            ctx,
            email: form.email,
            sent: false,
            error: Some(form_error(e)?),
        },
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
}

pub async fn reset_password_page(ctx: PageContext) -> AppResult<Response> {
    Ok(render(&ResetPasswordTemplate { ctx, error: None })?.into_response())
}

pub async fn reset_password_submit(
    ctx: PageContext,
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> AppResult<Response> {
    match account_service::reset_password(&state.baas, &form).await {
        Ok(()) => Ok(Redirect::to(&with_notice("/login", "password")).into_response()),
        Err(e) => {
            let template = ResetPasswordTemplate {
                ctx,
                error: Some(form_error(e)?),
            };
            Ok(render(&template)?.into_response())
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Response {
    if let Err(e) = auth_service::sign_out(&state.baas, &user.access_token).await {
        warn!("Upstream sign-out for {} failed: {}", user.id, e);
    }
    let mut response = Redirect::to(&with_notice("/login", "logout")).into_response();
    append_cookies(&mut response, &cleared_session_cookies());
    response
}
