use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::pets_repo::{self, PetQuery};
use crate::models::PetStatus;
use crate::services::listing::{PageWindow, ITEMS_PER_PAGE};
use crate::services::pets_service::{card_from_row, PetCard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyPetsTab {
    Todas,
    Activas,
    Inactivas,
    Resueltas,
}

impl MyPetsTab {
    pub const ALL: [MyPetsTab; 4] = [
        MyPetsTab::Todas,
        MyPetsTab::Activas,
        MyPetsTab::Inactivas,
        MyPetsTab::Resueltas,
    ];

    pub fn parse(raw: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| Some(t.as_str()) == raw.map(str::trim))
            .unwrap_or(MyPetsTab::Todas)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MyPetsTab::Todas => "todas",
            MyPetsTab::Activas => "activas",
            MyPetsTab::Inactivas => "inactivas",
            MyPetsTab::Resueltas => "resueltas",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MyPetsTab::Todas => "Todas",
            MyPetsTab::Activas => "Activas",
            MyPetsTab::Inactivas => "Inactivas",
            MyPetsTab::Resueltas => "Encontradas / Adoptadas",
        }
    }

    fn statuses(self) -> Vec<String> {
        let statuses: &[PetStatus] = match self {
            MyPetsTab::Todas => &[],
            MyPetsTab::Activas => &[PetStatus::Activo],
            MyPetsTab::Inactivas => &[PetStatus::Inactivo],
            MyPetsTab::Resueltas => &[PetStatus::Encontrado, PetStatus::Adoptado],
        };
        statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

pub struct TabLink {
    pub key: &'static str,
    pub label: &'static str,
    pub count: i64,
    pub active: bool,
}

pub struct MyPetsView {
    pub tabs: Vec<TabLink>,
    pub tab: MyPetsTab,
    pub pet_type: String,
    pub cards: Vec<PetCard>,
    pub window: PageWindow,
}

pub async fn load_my_pets_view(
    pool: &SqlitePool,
    baas_url: &str,
    user_id: &str,
    tab: MyPetsTab,
    pet_type: Option<&str>,
    page: u32,
) -> sqlx::Result<MyPetsView> {
    let pet_type = pet_type.map(str::trim).filter(|t| !t.is_empty());
    let base = PetQuery {
        user_id: Some(user_id.to_string()),
        pet_type: pet_type.map(str::to_string),
        ..PetQuery::default()
    };

    let mut tabs = Vec::with_capacity(MyPetsTab::ALL.len());
    for t in MyPetsTab::ALL {
        let query = PetQuery {
            statuses: t.statuses(),
            ..base.clone()
        };
        tabs.push(TabLink {
            key: t.as_str(),
            label: t.label(),
            count: pets_repo::count_pets(pool, &query).await?,
            active: t == tab,
        });
    }

    let total = tabs
        .iter()
        .find(|l| l.active)
        .map(|l| l.count)
        .unwrap_or(0);
    let window = PageWindow::new(total.max(0) as usize, page, ITEMS_PER_PAGE);
    let query = PetQuery {
        statuses: tab.statuses(),
        window: Some((window.offset() as i64, window.per_page as i64)),
        ..base
    };
    let now = Utc::now();
    let cards = pets_repo::list_pets(pool, &query)
        .await?
        .iter()
        .map(|r| card_from_row(r, baas_url, now))
        .collect();

    Ok(MyPetsView {
        tabs,
        tab,
        pet_type: pet_type.unwrap_or_default().to_string(),
        cards,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing::{new_pet, seed_pet, seed_profile, test_pool};

    async fn seeded() -> SqlitePool {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_profile(&pool, "u2", "Luis", "2024-01-01T00:00:00.000Z").await;
        let statuses = ["activo", "activo", "inactivo", "encontrado", "adoptado"];
        for (i, status) in statuses.iter().enumerate() {
            let mut pet = new_pet(&format!("p{}", i), "u1", "Mascota de Ana", if i == 0 { "gato" } else { "perro" }, &format!("2024-05-0{}T10:00:00.000Z", i + 1));
            pet.status = status.to_string();
            seed_pet(&pool, pet).await;
        }
        seed_pet(&pool, new_pet("other", "u2", "Mascota de Luis", "perro", "2024-05-09T10:00:00.000Z")).await;
        pool
    }

    #[tokio::test]
    async fn tabs_count_only_own_postings() {
        let pool = seeded().await;
        let view = load_my_pets_view(&pool, "http://baas", "u1", MyPetsTab::Todas, None, 1)
            .await
            .unwrap();
        let counts: Vec<(&str, i64)> = view.tabs.iter().map(|t| (t.key, t.count)).collect();
        assert_eq!(
            counts,
            vec![("todas", 5), ("activas", 2), ("inactivas", 1), ("resueltas", 2)]
        );
        assert_eq!(view.cards.len(), 5);
        assert!(view.cards.iter().all(|c| c.id != "other"));
    }

    #[tokio::test]
    async fn resolved_tab_and_type_filter_combine() {
        let pool = seeded().await;
        let view = load_my_pets_view(&pool, "http://baas", "u1", MyPetsTab::Resueltas, Some("perro"), 1)
            .await
            .unwrap();
        let ids: Vec<&str> = view.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p4", "p3"]);

        let cats = load_my_pets_view(&pool, "http://baas", "u1", MyPetsTab::Activas, Some("gato"), 1)
            .await
            .unwrap();
        assert_eq!(cats.cards.len(), 1);
        assert_eq!(cats.pet_type, "gato");
    }

    #[test]
    fn unknown_tab_falls_back_to_all() {
        assert_eq!(MyPetsTab::parse(Some("resueltas")), MyPetsTab::Resueltas);
        assert_eq!(MyPetsTab::parse(Some("borradas")), MyPetsTab::Todas);
        assert_eq!(MyPetsTab::parse(None), MyPetsTab::Todas);
    }
}
