use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::pets_repo::{self, PetQuery};
use crate::database::stats_repo::{self, AdminStatsRow};
use crate::database::{profiles_repo, timestamp};
use crate::error::{AppError, AppResult};
use crate::models::{PetStatus, ProfileRow};
use crate::services::display;
use crate::services::listing::{paginate, PageWindow, PetListFilter};
use crate::services::pets_service::{card_from_row, PetCard};
use crate::services::Actor;

pub const ROWS_PER_PAGE_OPTIONS: [u32; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10;

pub fn parse_rows_per_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| ROWS_PER_PAGE_OPTIONS.contains(n))
        .unwrap_or(DEFAULT_ROWS_PER_PAGE)
}

pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub async fn load_dashboard_stats(pool: &SqlitePool, now: DateTime<Utc>) -> sqlx::Result<AdminStatsRow> {
    stats_repo::load_admin_stats(pool, &timestamp(month_start(now))).await
}

pub struct AdminUserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub is_self: bool,
    pub initials: String,
    pub avatar_color: String,
    pub created_label: String,
    pub last_login_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersSummary {
    pub total: usize,
    pub admins: usize,
    pub with_phone: usize,
    pub recent: usize,
}

pub struct AdminUsersView {
    pub rows: Vec<AdminUserRow>,
    pub window: PageWindow,
    pub summary: UsersSummary,
    pub search: String,
}

fn profile_matches(profile: &ProfileRow, needle: &str) -> bool {
    [
        Some(profile.name.as_str()),
        Some(profile.email.as_str()),
        profile.phone.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn summarize_users(profiles: &[ProfileRow], now: DateTime<Utc>) -> UsersSummary {
    let since = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    UsersSummary {
        total: profiles.len(),
        admins: profiles.iter().filter(|p| p.is_admin).count(),
        with_phone: profiles
            .iter()
            .filter(|p| p.phone.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false))
            .count(),
        recent: profiles
            .iter()
            .filter_map(|p| display::parse_timestamp(&p.created_at))
            .filter(|created| *created >= since)
            .count(),
    }
}

/// Summary covers every account; search and paging only affect the rows.
pub async fn load_users_view(
    pool: &SqlitePool,
    viewer_id: &str,
    search: Option<&str>,
    page: u32,
    per_page: u32,
    now: DateTime<Utc>,
) -> sqlx::Result<AdminUsersView> {
    let profiles = profiles_repo::list_profiles(pool).await?;
    let summary = summarize_users(&profiles, now);

    let search = search.map(str::trim).unwrap_or_default().to_string();
    let needle = search.to_lowercase();
    let matching: Vec<ProfileRow> = profiles
        .into_iter()
        .filter(|p| needle.is_empty() || profile_matches(p, &needle))
        .collect();
    let page = paginate(matching, page, per_page);

    let rows = page
        .items
        .into_iter()
        .map(|p| {
            let label = if p.name.trim().is_empty() { p.email.clone() } else { p.name.clone() };
            AdminUserRow {
                is_self: p.id == viewer_id,
                initials: display::initials(&label),
                avatar_color: display::string_to_color(&label),
                created_label: display::format_date(&p.created_at),
                last_login_label: p
                    .last_login
                    .as_deref()
                    .map(|at| display::time_ago(at, now))
                    .unwrap_or_else(|| "Nunca".to_string()),
                id: p.id,
                name: p.name,
                email: p.email,
                phone: p.phone.unwrap_or_default(),
                is_admin: p.is_admin,
            }
        })
        .collect();

    Ok(AdminUsersView {
        rows,
        window: page.window,
        summary,
        search,
    })
}

/// Grants or revokes the admin flag. Admins cannot revoke their own.
pub async fn set_admin_flag(
    pool: &SqlitePool,
    actor: Actor<'_>,
    target_id: &str,
    make_admin: bool,
) -> AppResult<()> {
    if !actor.is_admin {
        return Err(AppError::Forbidden);
    }
    if target_id == actor.user_id && !make_admin {
        return Err(AppError::Validation(
            "No puedes quitarte tus propios permisos de administrador".to_string(),
        ));
    }
    if profiles_repo::set_admin(pool, target_id, make_admin).await? == 0 {
        return Err(AppError::NotFound);
    }
    info!("🛡️ {} set is_admin={} on {}", actor.user_id, make_admin, target_id);
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetsSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub found: usize,
}

pub struct AdminPetsView {
    pub cards: Vec<PetCard>,
    pub window: PageWindow,
    pub summary: PetsSummary,
}

pub async fn load_pets_view(
    pool: &SqlitePool,
    baas_url: &str,
    filter: &PetListFilter,
    page: u32,
    per_page: u32,
    now: DateTime<Utc>,
) -> sqlx::Result<AdminPetsView> {
    let rows = pets_repo::list_pets(pool, &PetQuery::default()).await?;

    let mut summary = PetsSummary {
        total: rows.len(),
        ..PetsSummary::default()
    };
    for row in &rows {
        match PetStatus::parse(&row.pet.status) {
            Some(PetStatus::Activo) => summary.active += 1,
            Some(PetStatus::Inactivo) => summary.inactive += 1,
            Some(status) if status.is_resolved() => summary.found += 1,
            _ => {}
        }
    }

    let matching = filter.apply(rows, |r| &r.pet);
    let page = paginate(matching, page, per_page);
    let cards = page
        .items
        .iter()
        .map(|r| card_from_row(r, baas_url, now))
        .collect();

    Ok(AdminPetsView {
        cards,
        window: page.window,
        summary,
    })
}
