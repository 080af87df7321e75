use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::database::stats_repo::AdminStatsRow;
use crate::error::{AppError, AppResult};
use crate::models::{PetStatus, PetType};
use crate::services::admin_service::{
    self, parse_rows_per_page, AdminUserRow, PetsSummary, UsersSummary, ROWS_PER_PAGE_OPTIONS,
};
use crate::services::listing::{parse_page, PetListFilter};
use crate::services::pets_service::{self, PetCard};
use crate::state::AppState;
use crate::web::layout::{query_string, select_options, PageContext, Pagination, SelectOption};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::pets::failure_notice;
use crate::web::{render, safe_return_path, with_notice};

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub ctx: PageContext,
    pub stats: AdminStatsRow,
}

pub async fn dashboard_page(ctx: PageContext, State(state): State<AppState>) -> AppResult<Response> {
    let stats = admin_service::load_dashboard_stats(&state.pool, Utc::now()).await?;
    Ok(render(&AdminDashboardTemplate { ctx, stats })?.into_response())
}

fn rows_options(current: u32) -> Vec<RowsOption> {
    ROWS_PER_PAGE_OPTIONS
        .iter()
        .map(|n| RowsOption {
            value: *n,
            selected: *n == current,
        })
        .collect()
}

pub struct RowsOption {
    pub value: u32,
    pub selected: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub rows: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub ctx: PageContext,
    pub rows: Vec<AdminUserRow>,
    pub summary: UsersSummary,
    pub search: String,
    pub rows_options: Vec<RowsOption>,
    pub pager: Pagination,
    pub return_to: String,
}

pub async fn users_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UsersQuery>,
) -> AppResult<Response> {
    let per_page = parse_rows_per_page(query.rows.as_deref());
    let view = admin_service::load_users_view(
        &state.pool,
        &user.id,
        query.search.as_deref(),
        parse_page(query.page.as_deref()),
        per_page,
        Utc::now(),
    )
    .await?;

    let rows = per_page.to_string();
    let pager = Pagination::new(
        &view.window,
        "/admin/users",
        &[("search", view.search.as_str()), ("rows", rows.as_str())],
    );
    let page = view.window.page.to_string();
    let return_to = format!(
        "/admin/users?{}",
        query_string(&[
            ("search", view.search.as_str()),
            ("rows", rows.as_str()),
            ("page", page.as_str()),
        ])
    );
    let template = AdminUsersTemplate {
        ctx,
        rows: view.rows,
        summary: view.summary,
        search: view.search,
        rows_options: rows_options(per_page),
        pager,
        return_to,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct ToggleAdminForm {
    pub make_admin: String,
    pub return_to: Option<String>,
}

pub async fn toggle_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(target_id): Path<String>,
    Form(form): Form<ToggleAdminForm>,
) -> Response {
    let make_admin = matches!(form.make_admin.trim(), "true" | "1" | "on");
    let target = safe_return_path(form.return_to.as_deref(), "/admin/users");
    let notice = match admin_service::set_admin_flag(&state.pool, user.actor(), &target_id, make_admin).await {
        Ok(()) => "admin",
        Err(AppError::Validation(_)) => "self_admin",
        Err(e) => {
            warn!("Admin flag change on {} by {} failed: {}", target_id, user.id, e);
            failure_notice(&e)
        }
    };
    Redirect::to(&with_notice(target, notice)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct PetsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub page: Option<String>,
    pub rows: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/pets.html")]
pub struct AdminPetsTemplate {
    pub ctx: PageContext,
    pub cards: Vec<PetCard>,
    pub summary: PetsSummary,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub type_options: Vec<SelectOption>,
    pub row_status_options: Vec<SelectOption>,
    pub rows_options: Vec<RowsOption>,
    pub pager: Pagination,
    pub return_to: String,
}

pub async fn pets_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Query(query): Query<PetsQuery>,
) -> AppResult<Response> {
    let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
    let search = trimmed(&query.search);
    let status = trimmed(&query.status);
    let pet_type = trimmed(&query.pet_type);
    let per_page = parse_rows_per_page(query.rows.as_deref());

    let filter = PetListFilter {
        pet_type: Some(pet_type.clone()).filter(|v| !v.is_empty()),
        pet_size: None,
        status: Some(status.clone()).filter(|v| !v.is_empty()),
        search: Some(search.clone()).filter(|v| !v.is_empty()),
    };
    let view = admin_service::load_pets_view(
        &state.pool,
        &state.config.baas.url,
        &filter,
        parse_page(query.page.as_deref()),
        per_page,
        Utc::now(),
    )
    .await?;

    let rows = per_page.to_string();
    let params = [
        ("search", search.as_str()),
        ("status", status.as_str()),
        ("type", pet_type.as_str()),
        ("rows", rows.as_str()),
    ];
    let pager = Pagination::new(&view.window, "/admin/pets", &params);
    let page = view.window.page.to_string();
    let mut return_params = params.to_vec();
    return_params.push(("page", page.as_str()));
    let return_params: Vec<(&str, &str)> = return_params
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect();
    let return_to = format!("/admin/pets?{}", query_string(&return_params));

    let template = AdminPetsTemplate {
        ctx,
        cards: view.cards,
        summary: view.summary,
        status_options: select_options(PetStatus::ALL.map(|s| (s.as_str(), s.label())), &status),
        type_options: select_options(PetType::ALL.map(|t| (t.as_str(), t.label())), &pet_type),
        row_status_options: select_options(PetStatus::ALL.map(|s| (s.as_str(), s.label())), ""),
        rows_options: rows_options(per_page),
        pager,
        return_to,
        search,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct PetStatusForm {
    pub status: String,
    pub return_to: Option<String>,
}

pub async fn pet_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
    Form(form): Form<PetStatusForm>,
) -> Response {
    let target = safe_return_path(form.return_to.as_deref(), "/admin/pets");
    let notice = match pets_service::change_status(&state.pool, user.actor(), &pet_id, &form.status).await {
        Ok(()) => "status",
        Err(e) => {
            warn!("Admin status change on pet {} failed: {}", pet_id, e);
            failure_notice(&e)
        }
    };
    Redirect::to(&with_notice(target, notice)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PetDeleteForm {
    pub return_to: Option<String>,
}

pub async fn pet_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(pet_id): Path<String>,
    Form(form): Form<PetDeleteForm>,
) -> Response {
    let target = safe_return_path(form.return_to.as_deref(), "/admin/pets");
    let notice = match pets_service::delete_pet(&state.pool, &state.baas, user.actor(), &pet_id).await {
        Ok(()) => "deleted",
        Err(e) => {
            warn!("Admin delete of pet {} failed: {}", pet_id, e);
            failure_notice(&e)
        }
    };
    Redirect::to(&with_notice(target, notice)).into_response()
}
