use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::{PetRow, PetWithOwnerRow, SimilarPetRow};

/// Filters for the posting lists. Empty fields do not filter.
#[derive(Debug, Default, Clone)]
pub struct PetQuery {
    pub pet_type: Option<String>,
    pub pet_size: Option<String>,
    pub pet_gender: Option<String>,
    /// Any of these statuses; empty means every status.
    pub statuses: Vec<String>,
    pub user_id: Option<String>,
    pub search: Option<String>,
    /// `(offset, limit)`
    pub window: Option<(i64, i64)>,
}

impl PetQuery {
    pub fn with_status(mut self, status: &str) -> Self {
        self.statuses = vec![status.to_string()];
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewPet {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub pet_type: String,
    pub pet_size: Option<String>,
    pub pet_color: Option<String>,
    pub pet_gender: Option<String>,
    pub pet_age: Option<String>,
    pub image_url: Option<String>,
    pub additional_images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PetChanges {
    pub title: String,
    pub description: String,
    pub pet_type: String,
    pub pet_size: Option<String>,
    pub pet_color: Option<String>,
    pub pet_gender: Option<String>,
    pub pet_age: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub status: String,
    /// `None` keeps the current main image.
    pub image_url: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct TypeCountRow {
    pub pet_type: String,
    pub count: i64,
}

#[derive(Debug, sqlx::FromRow, Clone, Default)]
pub struct UserPetStatsRow {
    pub total: i64,
    pub active: i64,
    pub views: i64,
}

const SQL_PET_COLUMNS: &str = r#"
    p.id, p.user_id, p.title, p.description, p.pet_type, p.pet_size, p.pet_color,
    p.pet_gender, p.pet_age, p.image_url, p.additional_images, p.latitude, p.longitude,
    p.address, p.status, p.views, p.created_at, p.updated_at
"#;

const SQL_OWNER_COLUMNS: &str = r#"
    o.name AS owner_name,
    o.email AS owner_email,
    o.phone AS owner_phone
"#;

pub const SQL_GET_PET: &str = r#"
SELECT id, user_id, title, description, pet_type, pet_size, pet_color, pet_gender, pet_age,
       image_url, additional_images, latitude, longitude, address, status, views,
       created_at, updated_at
FROM pets
WHERE id = ?1
LIMIT 1
"#;

pub const SQL_LIST_SIMILAR: &str = r#"
SELECT id, title, pet_type, image_url
FROM pets
WHERE pet_type = ?1
  AND status = 'activo'
  AND id != ?2
ORDER BY created_at DESC
LIMIT ?3
"#;

pub const SQL_INSERT_PET: &str = r#"
INSERT INTO pets (
    id, user_id, title, description, pet_type, pet_size, pet_color, pet_gender, pet_age,
    image_url, additional_images, latitude, longitude, address, status, views,
    search_text, created_at, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 0, ?16, ?17, ?17)
"#;

pub const SQL_UPDATE_PET: &str = r#"
UPDATE pets
SET title = ?2,
    description = ?3,
    pet_type = ?4,
    pet_size = ?5,
    pet_color = ?6,
    pet_gender = ?7,
    pet_age = ?8,
    latitude = ?9,
    longitude = ?10,
    address = ?11,
    status = ?12,
    image_url = COALESCE(?13, image_url),
    search_text = ?14,
    updated_at = ?15
WHERE id = ?1
"#;

pub const SQL_UPDATE_STATUS: &str = r#"
UPDATE pets
SET status = ?2,
    updated_at = ?3
WHERE id = ?1
"#;

pub const SQL_DELETE_PET: &str = r#"
DELETE FROM pets
WHERE id = ?1
"#;

pub const SQL_INCREMENT_VIEWS: &str = r#"
UPDATE pets
SET views = views + 1
WHERE id = ?1
"#;

pub const SQL_COUNT_BY_TYPE: &str = r#"
SELECT pet_type, COUNT(*) AS count
FROM pets
WHERE status = ?1
GROUP BY pet_type
"#;

pub const SQL_USER_STATS: &str = r#"
SELECT
    COUNT(*) AS total,
    COALESCE(SUM(CASE WHEN status = 'activo' THEN 1 ELSE 0 END), 0) AS active,
    COALESCE(SUM(views), 0) AS views
FROM pets
WHERE user_id = ?1
"#;

pub async fn list_pets(pool: &SqlitePool, query: &PetQuery) -> sqlx::Result<Vec<PetWithOwnerRow>> {
    let mut sql = format!(
        "SELECT {}, {} FROM pets p LEFT JOIN profiles o ON o.id = p.user_id WHERE 1 = 1",
        SQL_PET_COLUMNS, SQL_OWNER_COLUMNS
    );
    let mut args = SqliteArguments::default();
    push_filters(&mut sql, &mut args, query)?;

    sql.push_str(" ORDER BY p.created_at DESC");
    if let Some((offset, limit)) = query.window {
        sql.push_str(" LIMIT ? OFFSET ?");
        args.add(limit.max(0)).map_err(sqlx::Error::Encode)?;
        args.add(offset.max(0)).map_err(sqlx::Error::Encode)?;
    }

    sqlx::query_as_with::<_, PetWithOwnerRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}

/// Number of postings matching `query`, ignoring its window.
pub async fn count_pets(pool: &SqlitePool, query: &PetQuery) -> sqlx::Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM pets p WHERE 1 = 1");
    let mut args = SqliteArguments::default();
    push_filters(&mut sql, &mut args, query)?;

    sqlx::query_scalar_with::<_, i64, _>(&sql, args)
        .fetch_one(pool)
        .await
}

fn push_filters<'q>(
    sql: &mut String,
    args: &mut SqliteArguments<'q>,
    query: &PetQuery,
) -> sqlx::Result<()> {
    let equals = [
        ("p.pet_type", &query.pet_type),
        ("p.pet_size", &query.pet_size),
        ("p.pet_gender", &query.pet_gender),
        ("p.user_id", &query.user_id),
    ];
    for (column, value) in equals {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            sql.push_str(&format!(" AND {} = ?", column));
            args.add(value.to_string()).map_err(sqlx::Error::Encode)?;
        }
    }

    if !query.statuses.is_empty() {
        let placeholders = vec!["?"; query.statuses.len()].join(", ");
        sql.push_str(&format!(" AND p.status IN ({})", placeholders));
        for status in &query.statuses {
            args.add(status.clone()).map_err(sqlx::Error::Encode)?;
        }
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(" AND p.search_text LIKE ? ESCAPE '\\'");
        args.add(format!("%{}%", escape_like(&search.to_lowercase())))
            .map_err(sqlx::Error::Encode)?;
    }
    Ok(())
}

/// SQLite's `lower()` only folds ASCII, so the searchable text is folded
/// here and stored alongside the row.
fn search_text(title: &str, description: &str, address: Option<&str>) -> String {
    format!("{}\n{}\n{}", title, description, address.unwrap_or_default()).to_lowercase()
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn get_pet(pool: &SqlitePool, pet_id: &str) -> sqlx::Result<Option<PetRow>> {
    sqlx::query_as::<_, PetRow>(SQL_GET_PET)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_pet_with_owner(
    pool: &SqlitePool,
    pet_id: &str,
) -> sqlx::Result<Option<PetWithOwnerRow>> {
    let sql = format!(
        "SELECT {}, {} FROM pets p LEFT JOIN profiles o ON o.id = p.user_id WHERE p.id = ?1 LIMIT 1",
        SQL_PET_COLUMNS, SQL_OWNER_COLUMNS
    );
    sqlx::query_as::<_, PetWithOwnerRow>(&sql)
        .bind(pet_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_similar(
    pool: &SqlitePool,
    pet_type: &str,
    exclude_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<SimilarPetRow>> {
    sqlx::query_as::<_, SimilarPetRow>(SQL_LIST_SIMILAR)
        .bind(pet_type)
        .bind(exclude_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn insert_pet(pool: &SqlitePool, pet: &NewPet) -> sqlx::Result<()> {
    let additional_images =
        serde_json::to_string(&pet.additional_images).unwrap_or_else(|_| "[]".to_string());
    sqlx::query(SQL_INSERT_PET)
        .bind(&pet.id)
        .bind(&pet.user_id)
        .bind(&pet.title)
        .bind(&pet.description)
        .bind(&pet.pet_type)
        .bind(&pet.pet_size)
        .bind(&pet.pet_color)
        .bind(&pet.pet_gender)
        .bind(&pet.pet_age)
        .bind(&pet.image_url)
        .bind(additional_images)
        .bind(pet.latitude)
        .bind(pet.longitude)
        .bind(&pet.address)
        .bind(&pet.status)
        .bind(search_text(&pet.title, &pet.description, pet.address.as_deref()))
        .bind(&pet.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_pet(pool: &SqlitePool, pet_id: &str, changes: &PetChanges) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_PET)
        .bind(pet_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.pet_type)
        .bind(&changes.pet_size)
        .bind(&changes.pet_color)
        .bind(&changes.pet_gender)
        .bind(&changes.pet_age)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(&changes.address)
        .bind(&changes.status)
        .bind(&changes.image_url)
        .bind(search_text(
            &changes.title,
            &changes.description,
            changes.address.as_deref(),
        ))
        .bind(&changes.updated_at)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_status(
    pool: &SqlitePool,
    pet_id: &str,
    status: &str,
    updated_at: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_STATUS)
        .bind(pet_id)
        .bind(status)
        .bind(updated_at)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_pet(pool: &SqlitePool, pet_id: &str) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_DELETE_PET).bind(pet_id).execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn increment_views(pool: &SqlitePool, pet_id: &str) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_INCREMENT_VIEWS)
        .bind(pet_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_pets_by_type(pool: &SqlitePool, status: &str) -> sqlx::Result<Vec<TypeCountRow>> {
    sqlx::query_as::<_, TypeCountRow>(SQL_COUNT_BY_TYPE)
        .bind(status)
        .fetch_all(pool)
        .await
}

pub async fn user_stats(pool: &SqlitePool, user_id: &str) -> sqlx::Result<UserPetStatsRow> {
    sqlx::query_as::<_, UserPetStatsRow>(SQL_USER_STATS)
        .bind(user_id)
        .fetch_one(pool)
        .await
}
