use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};

use crate::error::AppResult;
use crate::services::dashboard_service::{self, DashboardView};
use crate::state::AppState;
use crate::web::layout::PageContext;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub view: DashboardView,
}

pub async fn dashboard_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Response> {
    let view = dashboard_service::load_dashboard_view(&state.pool, &state.config.baas.url, &user.id).await?;
    Ok(render(&DashboardTemplate { ctx, view })?.into_response())
}
