use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow, Clone, Default)]
pub struct AdminStatsRow {
    pub total_pets: i64,
    pub active_pets: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub total_views: i64,
    pub pets_this_month: i64,
    pub users_this_month: i64,
}

/// `?1` is the first instant of the current month.
pub const SQL_ADMIN_STATS: &str = r#"
SELECT
    (SELECT COUNT(*) FROM pets) AS total_pets,
    (SELECT COUNT(*) FROM pets WHERE status = 'activo') AS active_pets,
    (SELECT COUNT(*) FROM profiles) AS total_users,
    (SELECT COUNT(*) FROM profiles WHERE last_login IS NOT NULL AND last_login >= ?1) AS active_users,
    (SELECT COALESCE(SUM(views), 0) FROM pets) AS total_views,
    (SELECT COUNT(*) FROM pets WHERE created_at >= ?1) AS pets_this_month,
    (SELECT COUNT(*) FROM profiles WHERE created_at >= ?1) AS users_this_month
"#;

pub async fn load_admin_stats(pool: &SqlitePool, month_start: &str) -> sqlx::Result<AdminStatsRow> {
    sqlx::query_as::<_, AdminStatsRow>(SQL_ADMIN_STATS)
        .bind(month_start)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::pets_repo;
    use crate::database::profiles_repo;
    use crate::database::testing::{new_pet, seed_pet, seed_profile, test_pool};

    #[tokio::test]
    async fn counts_split_at_month_start() {
        let pool = test_pool().await;
        seed_profile(&pool, "old", "Ana", "2024-04-10T00:00:00.000Z").await;
        seed_profile(&pool, "new", "Luis", "2024-05-03T00:00:00.000Z").await;
        profiles_repo::touch_last_login(&pool, "old", "2024-05-04T00:00:00.000Z")
            .await
            .unwrap();

        seed_pet(&pool, new_pet("p1", "old", "Gato del barrio", "gato", "2024-04-20T00:00:00.000Z")).await;
        let mut adopted = new_pet("p2", "new", "Perro adoptado", "perro", "2024-05-05T00:00:00.000Z");
        adopted.status = "adoptado".into();
        seed_pet(&pool, adopted).await;
        pets_repo::increment_views(&pool, "p1").await.unwrap();
        pets_repo::increment_views(&pool, "p2").await.unwrap();
        pets_repo::increment_views(&pool, "p2").await.unwrap();

        let stats = load_admin_stats(&pool, "2024-05-01T00:00:00.000Z").await.unwrap();
        assert_eq!(stats.total_pets, 2);
        assert_eq!(stats.active_pets, 1);
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
        assert_eq!(stats.total_views, 3);
        assert_eq!(stats.pets_this_month, 1);
        assert_eq!(stats.users_this_month, 1);
    }

    #[tokio::test]
    async fn empty_database_is_all_zero() {
        let pool = test_pool().await;
        let stats = load_admin_stats(&pool, "2024-05-01T00:00:00.000Z").await.unwrap();
        assert_eq!(stats.total_pets + stats.total_users + stats.total_views, 0);
    }
}
