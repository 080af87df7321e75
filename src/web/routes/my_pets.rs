use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::PetType;
use crate::services::listing::parse_page;
use crate::services::my_pets_service::{self, MyPetsTab, TabLink};
use crate::services::pets_service::PetCard;
use crate::state::AppState;
use crate::web::layout::{query_string, select_options, PageContext, Pagination, SelectOption};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

#[derive(Debug, Default, Deserialize)]
pub struct MyPetsQuery {
    pub tab: Option<String>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub page: Option<String>,
}

pub struct TabView {
    pub link: TabLink,
    pub href: String,
}

#[derive(Template)]
#[template(path = "my_pets.html")]
pub struct MyPetsTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<TabView>,
    pub tab: &'static str,
    pub cards: Vec<PetCard>,
    pub pager: Pagination,
    pub type_options: Vec<SelectOption>,
    pub return_to: String,
}

pub async fn my_pets_page(
    ctx: PageContext,
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<MyPetsQuery>,
) -> AppResult<Response> {
    let tab = MyPetsTab::parse(query.tab.as_deref());
    let view = my_pets_service::load_my_pets_view(
        &state.pool,
        &state.config.baas.url,
        &user.id,
        tab,
        query.pet_type.as_deref(),
        parse_page(query.page.as_deref()),
    )
    .await?;

    let tabs = view
        .tabs
        .into_iter()
        .map(|link| TabView {
            href: format!("/my-pets?{}", query_string(&[("tab", link.key), ("type", view.pet_type.as_str())])),
            link,
        })
        .collect();
    let params = [("tab", tab.as_str()), ("type", view.pet_type.as_str())];
    let pager = Pagination::new(&view.window, "/my-pets", &params);
    let page = view.window.page.to_string();
    let return_to = format!(
        "/my-pets?{}",
        query_string(&[("tab", tab.as_str()), ("page", page.as_str())])
    );

    let template = MyPetsTemplate {
        ctx,
        tabs,
        tab: tab.as_str(),
        cards: view.cards,
        pager,
        type_options: select_options(PetType::ALL.map(|t| (t.as_str(), t.label())), &view.pet_type),
        return_to,
    };
    Ok(render(&template)?.into_response())
}
