use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::pets_repo::{self, PetQuery};
use crate::services::pets_service::{card_from_row, PetCard};

const RECENT_LIMIT: i64 = 3;

pub struct DashboardView {
    pub total_pets: i64,
    pub active_pets: i64,
    pub total_views: i64,
    pub recent: Vec<PetCard>,
}

pub async fn load_dashboard_view(
    pool: &SqlitePool,
    baas_url: &str,
    user_id: &str,
) -> sqlx::Result<DashboardView> {
    let stats = pets_repo::user_stats(pool, user_id).await?;
    let query = PetQuery {
        user_id: Some(user_id.to_string()),
        window: Some((0, RECENT_LIMIT)),
        ..PetQuery::default()
    };
    let now = Utc::now();
    let recent = pets_repo::list_pets(pool, &query)
        .await?
        .iter()
        .map(|r| card_from_row(r, baas_url, now))
        .collect();

    Ok(DashboardView {
        total_pets: stats.total,
        active_pets: stats.active,
        total_views: stats.views,
        recent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{new_pet, seed_pet, seed_profile, test_pool};

    #[tokio::test]
    async fn stats_and_three_most_recent() {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        for i in 1..=4 {
            let mut pet = new_pet(&format!("p{}", i), "u1", "Mascota perdida", "perro", &format!("2024-05-0{}T10:00:00.000Z", i));
            if i == 1 {
                pet.status = "adoptado".into();
            }
            seed_pet(&pool, pet).await;
        }
        pets_repo::increment_views(&pool, "p1").await.unwrap();

        let view = load_dashboard_view(&pool, "http://baas", "u1").await.unwrap();
        assert_eq!((view.total_pets, view.active_pets, view.total_views), (4, 3, 1));
        let ids: Vec<&str> = view.recent.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p4", "p3", "p2"]);
    }

    #[tokio::test]
    async fn new_user_has_empty_dashboard() {
        let pool = test_pool().await;
        let view = load_dashboard_view(&pool, "http://baas", "nobody").await.unwrap();
        assert_eq!(view.total_pets, 0);
        assert!(view.recent.is_empty());
    }
}
