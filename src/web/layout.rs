//! Data every page shares: the navigation bar, the theme and the flash
//! notice carried in `?notice=`.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::services::display;
use crate::services::listing::PageWindow;
use crate::web::middleware::auth::{read_cookie, AuthenticatedUser, CurrentUser};

pub const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// `success`, `info` or `error`; used as the alert CSS modifier.
    pub kind: &'static str,
    pub message: &'static str,
}

pub fn notice_for(code: &str) -> Option<Notice> {
    let (kind, message) = match code {
        "created" => ("success", "¡Mascota publicada correctamente!"),
        "updated" => ("success", "Mascota actualizada correctamente"),
        "deleted" => ("success", "Mascota eliminada correctamente"),
        "status" => ("success", "Estado actualizado"),
        "profile" => ("success", "Perfil actualizado correctamente"),
        "admin" => ("success", "Permisos de administrador actualizados"),
        "registered" => (
            "info",
            "Cuenta creada. Revisa tu email para confirmar tu cuenta antes de iniciar sesión.",
        ),
        "recovery" => (
            "info",
            "Si el email está registrado, recibirás un enlace para restablecer tu contraseña.",
        ),
        "password" => ("success", "Contraseña actualizada. Ya puedes iniciar sesión."),
        "logout" => ("info", "Has cerrado sesión"),
        "self_admin" => (
            "error",
            "No puedes quitarte tus propios permisos de administrador",
        ),
        "forbidden" => ("error", "No tienes permiso para realizar esta acción"),
        "not_found" => ("error", "La mascota no existe o ya fue eliminada"),
        "error" => ("error", "No se pudo completar la acción. Inténtalo de nuevo."),
        _ => return None,
    };
    Some(Notice { kind, message })
}

/// Extracted by every page handler; reads what the auth layer attached.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub signed_in: bool,
    pub is_admin: bool,
    pub user_name: String,
    pub initials: String,
    pub avatar_color: String,
    pub dark: bool,
    pub notice: Option<Notice>,
    pub path: String,
    pub build_id: &'static str,
}

impl PageContext {
    pub fn new(user: Option<&AuthenticatedUser>, dark: bool, notice: Option<Notice>, path: &str) -> Self {
        let user_name = user
            .map(|u| if u.name.trim().is_empty() { u.email.clone() } else { u.name.clone() })
            .unwrap_or_default();
        Self {
            signed_in: user.is_some(),
            is_admin: user.map(|u| u.is_admin).unwrap_or(false),
            initials: display::initials(&user_name),
            avatar_color: display::string_to_color(&user_name),
            user_name,
            dark,
            notice,
            path: path.to_string(),
            build_id: option_env!("PET_RESCUE_BUILD_ID").unwrap_or("dev"),
        }
    }

    /// Replaces the `?notice=` message, for pages that report inline.
    pub fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }

    pub fn is_section(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.path == "/";
        }
        self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default();
        let dark = read_cookie(&parts.headers, THEME_COOKIE).as_deref() == Some("dark");
        let notice = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(params)| params.get("notice").and_then(|code| notice_for(code)));
        Ok(PageContext::new(current.0.as_ref(), dark, notice, parts.uri.path()))
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub fn select_options(
    values: impl IntoIterator<Item = (&'static str, &'static str)>,
    current: &str,
) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|(value, label)| SelectOption {
            value,
            label,
            selected: value == current,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Pager links that keep the listing's other query parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub links: Vec<PageLink>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub first_shown: usize,
    pub last_shown: usize,
    pub total_items: usize,
}

impl Pagination {
    pub fn new(window: &PageWindow, path: &str, params: &[(&str, &str)]) -> Self {
        let href = |page: u32| {
            let page = page.to_string();
            let mut pairs: Vec<(&str, &str)> = params
                .iter()
                .copied()
                .filter(|(_, v)| !v.trim().is_empty())
                .collect();
            pairs.push(("page", page.as_str()));
            format!("{}?{}", path, query_string(&pairs))
        };
        let (first_shown, last_shown) = window.shown_range();
        Self {
            links: window
                .pages()
                .into_iter()
                .map(|n| PageLink {
                    number: n,
                    href: href(n),
                    current: n == window.page,
                })
                .collect(),
            prev: window.has_prev().then(|| href(window.prev_page())),
            next: window.has_next().then(|| href(window.next_page())),
            first_shown,
            last_shown,
            total_items: window.total_items,
        }
    }

    pub fn is_multi_page(&self) -> bool {
        self.links.len() > 1
    }
}

/// `application/x-www-form-urlencoded` serialization of `pairs`.
pub fn query_string(pairs: &[(&str, &str)]) -> String {
    reqwest::Url::parse_with_params("http://localhost/", pairs)
        .ok()
        .and_then(|u| u.query().map(str::to_string))
        .unwrap_or_default()
}
