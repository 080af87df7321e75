use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{PetSize, PetType};
use crate::services::listing::{parse_page, PetListFilter};
use crate::services::pets_service::{self, PetCard, TypeCounts};
use crate::state::AppState;
use crate::web::layout::{select_options, PageContext, Pagination, SelectOption};
use crate::web::render;

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub size: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub cards: Vec<PetCard>,
    pub counts: TypeCounts,
    pub pager: Pagination,
    pub type_options: Vec<SelectOption>,
    pub size_options: Vec<SelectOption>,
    pub search: String,
    pub filtered: bool,
}

pub async fn home_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> AppResult<Response> {
    let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
    let pet_type = trimmed(&query.pet_type);
    let size = trimmed(&query.size);
    let search = trimmed(&query.search);

    let filter = PetListFilter {
        pet_type: Some(pet_type.clone()).filter(|v| !v.is_empty()),
        pet_size: Some(size.clone()).filter(|v| !v.is_empty()),
        status: None,
        search: Some(search.clone()).filter(|v| !v.is_empty()),
    };
    let view = pets_service::load_home_view(
        &state.pool,
        &state.config.baas.url,
        &filter,
        parse_page(query.page.as_deref()),
    )
    .await?;

    let pager = Pagination::new(
        &view.window,
        "/",
        &[
            ("type", pet_type.as_str()),
            ("size", size.as_str()),
            ("search", search.as_str()),
        ],
    );
    let template = HomeTemplate {
        ctx,
        cards: view.cards,
        counts: view.counts,
        pager,
        type_options: select_options(PetType::ALL.map(|t| (t.as_str(), t.label())), &pet_type),
        size_options: select_options(PetSize::ALL.map(|s| (s.as_str(), s.label())), &size),
        filtered: !(pet_type.is_empty() && size.is_empty() && search.is_empty()),
        search,
    };
    Ok(render(&template)?.into_response())
}
