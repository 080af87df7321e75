use sqlx::SqlitePool;

use crate::models::ProfileRow;

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

const SQL_PROFILE_COLUMNS: &str = "id, name, email, phone, profile_image, is_admin, created_at, last_login";

pub const SQL_UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (id, name, email, phone, is_admin, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    email = excluded.email,
    phone = COALESCE(excluded.phone, profiles.phone),
    is_admin = excluded.is_admin
"#;

pub const SQL_INSERT_PROFILE_IF_MISSING: &str = r#"
INSERT INTO profiles (id, name, email, is_admin, created_at)
VALUES (?1, ?2, ?3, 0, ?4)
ON CONFLICT(id) DO NOTHING
"#;

pub const SQL_UPDATE_PROFILE: &str = r#"
UPDATE profiles
SET name = ?2,
    phone = ?3,
    profile_image = COALESCE(?4, profile_image)
WHERE id = ?1
"#;

pub const SQL_SET_ADMIN: &str = r#"
UPDATE profiles
SET is_admin = ?2
WHERE id = ?1
"#;

pub const SQL_TOUCH_LAST_LOGIN: &str = r#"
UPDATE profiles
SET last_login = ?2
WHERE id = ?1
"#;

pub const SQL_DELETE_PROFILE: &str = r#"
DELETE FROM profiles
WHERE id = ?1
"#;

pub async fn load_profile(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<ProfileRow>> {
    let sql = format!("SELECT {} FROM profiles WHERE id = ?1 LIMIT 1", SQL_PROFILE_COLUMNS);
    sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile_by_email(
    pool: &SqlitePool,
    email: &str,
) -> sqlx::Result<Option<ProfileRow>> {
    let sql = format!(
        "SELECT {} FROM profiles WHERE lower(email) = lower(?1) LIMIT 1",
        SQL_PROFILE_COLUMNS
    );
    sqlx::query_as::<_, ProfileRow>(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await
}

/// Newest accounts first.
pub async fn list_profiles(pool: &SqlitePool) -> sqlx::Result<Vec<ProfileRow>> {
    let sql = format!(
        "SELECT {} FROM profiles ORDER BY created_at DESC",
        SQL_PROFILE_COLUMNS
    );
    sqlx::query_as::<_, ProfileRow>(&sql).fetch_all(pool).await
}

pub async fn upsert_profile(pool: &SqlitePool, profile: &NewProfile) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_PROFILE)
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(profile.is_admin)
        .bind(&profile.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates a plain profile for an auth user that has none yet. Returns
/// whether a row was inserted.
pub async fn insert_profile_if_missing(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    email: &str,
    created_at: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query(SQL_INSERT_PROFILE_IF_MISSING)
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(created_at)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    phone: Option<&str>,
    profile_image: Option<&str>,
) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_PROFILE)
        .bind(user_id)
        .bind(name)
        .bind(phone)
        .bind(profile_image)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn set_admin(pool: &SqlitePool, user_id: &str, is_admin: bool) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_SET_ADMIN)
        .bind(user_id)
        .bind(is_admin)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch_last_login(pool: &SqlitePool, user_id: &str, at: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_TOUCH_LAST_LOGIN)
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_profile(pool: &SqlitePool, user_id: &str) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_DELETE_PROFILE)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
