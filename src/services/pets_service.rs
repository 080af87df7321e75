use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::pets_repo::{self, NewPet, PetChanges, PetQuery};
use crate::database::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::pet_enums::{age_label, gender_label, size_label, status_badge, status_label, type_label};
use crate::models::{PetRow, PetStatus, PetWithOwnerRow};
use crate::services::baas::BaasClient;
use crate::services::display;
use crate::services::listing::{PageWindow, PetListFilter, ITEMS_PER_PAGE};
use crate::services::pet_form::{first_error_message, validate_images, ImageRules, ImageUpload, PetForm};
use crate::services::storage_service::{self, UploadObject, PET_IMAGES_BUCKET};
use crate::services::Actor;

const SIMILAR_LIMIT: i64 = 4;
const OWNER_FALLBACK: &str = "Usuario";

/// One posting as shown in a grid or table.
#[derive(Debug, Clone)]
pub struct PetCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub pet_type: String,
    pub type_label: String,
    pub size_label: String,
    pub status: String,
    pub status_label: String,
    pub status_badge: &'static str,
    pub image_url: String,
    pub address: Option<String>,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub views: i64,
    pub created_label: String,
    pub time_ago: String,
}

fn pet_card(
    pet: &PetRow,
    owner_name: Option<&str>,
    owner_email: Option<&str>,
    baas_url: &str,
    now: DateTime<Utc>,
) -> PetCard {
    PetCard {
        id: pet.id.clone(),
        title: pet.title.clone(),
        description: pet.description.clone(),
        pet_type: pet.pet_type.clone(),
        type_label: type_label(&pet.pet_type),
        size_label: size_label(pet.pet_size.as_deref()),
        status: pet.status.clone(),
        status_label: status_label(&pet.status),
        status_badge: status_badge(&pet.status),
        image_url: storage_service::public_url(baas_url, PET_IMAGES_BUCKET, pet.image_url.as_deref()),
        address: pet.address.clone().filter(|a| !a.trim().is_empty()),
        owner_name: owner_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(OWNER_FALLBACK)
            .to_string(),
        owner_email: owner_email.map(str::to_string),
        views: pet.views,
        created_label: display::format_date(&pet.created_at),
        time_ago: display::time_ago(&pet.created_at, now),
    }
}

pub fn card_from_row(row: &PetWithOwnerRow, baas_url: &str, now: DateTime<Utc>) -> PetCard {
    pet_card(&row.pet, row.owner_name.as_deref(), row.owner_email.as_deref(), baas_url, now)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub perro: i64,
    pub gato: i64,
    pub otros: i64,
}

pub struct HomeView {
    pub cards: Vec<PetCard>,
    pub window: PageWindow,
    pub counts: TypeCounts,
}

/// Active postings only, newest first, `ITEMS_PER_PAGE` per page.
pub async fn load_home_view(
    pool: &SqlitePool,
    baas_url: &str,
    filter: &PetListFilter,
    page: u32,
) -> sqlx::Result<HomeView> {
    let mut query = PetQuery {
        pet_type: filter.pet_type.clone(),
        pet_size: filter.pet_size.clone(),
        search: filter.search.clone(),
        ..PetQuery::default()
    }
    .with_status(PetStatus::Activo.as_str());

    let total = pets_repo::count_pets(pool, &query).await?;
    let window = PageWindow::new(total.max(0) as usize, page, ITEMS_PER_PAGE);
    query.window = Some((window.offset() as i64, window.per_page as i64));
    let rows = pets_repo::list_pets(pool, &query).await?;

    let now = Utc::now();
    let cards = rows.iter().map(|r| card_from_row(r, baas_url, now)).collect();

    let mut counts = TypeCounts::default();
    for row in pets_repo::count_pets_by_type(pool, PetStatus::Activo.as_str()).await? {
        match row.pet_type.as_str() {
            "perro" => counts.perro += row.count,
            "gato" => counts.gato += row.count,
            _ => counts.otros += row.count,
        }
    }

    Ok(HomeView {
        cards,
        window,
        counts,
    })
}

pub struct SimilarPetCard {
    pub id: String,
    pub title: String,
    pub type_label: String,
    pub image_url: String,
}

pub struct PetDetailView {
    pub card: PetCard,
    pub user_id: String,
    pub gender_label: String,
    pub age_label: String,
    pub color: String,
    pub image_urls: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_phone: Option<String>,
    pub similar: Vec<SimilarPetCard>,
}

/// Counts the visit, then loads the posting with its owner contact and a
/// few active postings of the same type.
pub async fn load_detail_view(
    pool: &SqlitePool,
    baas_url: &str,
    pet_id: &str,
) -> sqlx::Result<Option<PetDetailView>> {
    if let Err(e) = pets_repo::increment_views(pool, pet_id).await {
        warn!("View counter update failed for {}: {}", pet_id, e);
    }

    let Some(row) = pets_repo::get_pet_with_owner(pool, pet_id).await? else {
        return Ok(None);
    };
    let similar = pets_repo::list_similar(pool, &row.pet.pet_type, &row.pet.id, SIMILAR_LIMIT)
        .await?
        .into_iter()
        .map(|s| SimilarPetCard {
            image_url: storage_service::public_url(baas_url, PET_IMAGES_BUCKET, s.image_url.as_deref()),
            type_label: type_label(&s.pet_type),
            id: s.id,
            title: s.title,
        })
        .collect();

    let mut image_urls: Vec<String> = row
        .pet
        .all_image_paths()
        .iter()
        .map(|p| storage_service::public_url(baas_url, PET_IMAGES_BUCKET, Some(p)))
        .collect();
    if image_urls.is_empty() {
        image_urls.push(storage_service::PET_PLACEHOLDER.to_string());
    }

    let pet = &row.pet;
    Ok(Some(PetDetailView {
        card: card_from_row(&row, baas_url, Utc::now()),
        user_id: pet.user_id.clone(),
        gender_label: gender_label(pet.pet_gender.as_deref()),
        age_label: age_label(pet.pet_age.as_deref()),
        color: pet
            .pet_color
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "No especificado".to_string()),
        image_urls,
        latitude: pet.latitude,
        longitude: pet.longitude,
        owner_phone: row.owner_phone.clone().filter(|p| !p.trim().is_empty()),
        similar,
    }))
}

/// The posting if `actor` may change it: owners and admins only.
pub async fn load_managed_pet(pool: &SqlitePool, actor: Actor<'_>, pet_id: &str) -> AppResult<PetRow> {
    let pet = pets_repo::get_pet(pool, pet_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if pet.user_id != actor.user_id && !actor.is_admin {
        warn!("User {} tried to manage pet {} owned by {}", actor.user_id, pet.id, pet.user_id);
        return Err(AppError::Forbidden);
    }
    Ok(pet)
}

fn first_form_error(form: &PetForm) -> AppResult<()> {
    match first_error_message(&form.field_errors()) {
        Some(message) => Err(AppError::Validation(message.to_string())),
        None => Ok(()),
    }
}

fn content_type_for(image: &ImageUpload) -> String {
    if image.content_type.starts_with("image/") {
        return image.content_type.clone();
    }
    match image.extension().as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
    .to_string()
}

async fn upload_pet_image(
    baas: &BaasClient,
    actor: Actor<'_>,
    path: &str,
    image: ImageUpload,
) -> Result<String, crate::services::baas::BaasError> {
    let content_type = content_type_for(&image);
    storage_service::upload_object(
        baas,
        actor.access_token,
        PET_IMAGES_BUCKET,
        UploadObject {
            path,
            bytes: image.bytes,
            content_type: &content_type,
        },
    )
    .await
}

/// Best-effort removal of photos whose row was never written.
async fn discard_uploads(baas: &BaasClient, actor: Actor<'_>, paths: &[String]) {
    if let Err(e) = storage_service::remove_objects(baas, actor.access_token, PET_IMAGES_BUCKET, paths).await {
        warn!("Orphaned uploads {:?} could not be removed: {}", paths, e);
    }
}

/// Validates, uploads the photos (main first) and inserts the posting as
/// active. Returns the new id.
pub async fn create_pet(
    pool: &SqlitePool,
    baas: &BaasClient,
    actor: Actor<'_>,
    form: &PetForm,
    images: Vec<ImageUpload>,
) -> AppResult<String> {
    validate_images(&images, ImageRules::CREATE).map_err(AppError::Validation)?;
    first_form_error(form)?;

    let millis = Utc::now().timestamp_millis();
    let mut images = images.into_iter();
    let main = images
        .next()
        .ok_or_else(|| AppError::Validation(crate::services::pet_form::NO_IMAGES_MESSAGE.to_string()))?;
    let main_path = format!("{}/{}_main", actor.user_id, millis);
    let image_url = upload_pet_image(baas, actor, &main_path, main).await?;

    let mut additional_images = Vec::new();
    for (i, image) in images.enumerate() {
        let path = format!("{}/{}_{}", actor.user_id, millis, i + 1);
        match upload_pet_image(baas, actor, &path, image).await {
            Ok(stored) => additional_images.push(stored),
            Err(e) => warn!("Additional image {} upload failed, skipping: {}", path, e),
        }
    }

    let (latitude, longitude) = form.coordinates();
    let pet = NewPet {
        id: Uuid::new_v4().to_string(),
        user_id: actor.user_id.to_string(),
        title: form.title.trim().to_string(),
        description: form.description.trim().to_string(),
        pet_type: form.pet_type.clone(),
        pet_size: PetForm::optional(&form.pet_size),
        pet_color: PetForm::optional(&form.pet_color),
        pet_gender: PetForm::optional(&form.pet_gender),
        pet_age: PetForm::optional(&form.pet_age),
        image_url: Some(image_url),
        additional_images,
        latitude,
        longitude,
        address: PetForm::optional(&form.address),
        status: PetStatus::Activo.as_str().to_string(),
        created_at: now_timestamp(),
    };
    if let Err(e) = pets_repo::insert_pet(pool, &pet).await {
        let mut uploaded = pet.additional_images;
        uploaded.extend(pet.image_url);
        discard_uploads(baas, actor, &uploaded).await;
        return Err(e.into());
    }
    info!("🐾 Pet {} created by {}", pet.id, actor.user_id);
    Ok(pet.id)
}

/// Saves the editable fields; a new photo replaces the main image and the
/// previous one is removed from storage.
pub async fn update_pet(
    pool: &SqlitePool,
    baas: &BaasClient,
    actor: Actor<'_>,
    pet_id: &str,
    form: &PetForm,
    images: Vec<ImageUpload>,
) -> AppResult<()> {
    let pet = load_managed_pet(pool, actor, pet_id).await?;
    validate_images(&images, ImageRules::EDIT).map_err(AppError::Validation)?;
    first_form_error(form)?;

    let new_image = match images.into_iter().next() {
        Some(image) => {
            let path = format!("{}/{}_updated", actor.user_id, Utc::now().timestamp_millis());
            Some(upload_pet_image(baas, actor, &path, image).await?)
        }
        None => None,
    };

    let (latitude, longitude) = form.coordinates();
    let changes = PetChanges {
        title: form.title.trim().to_string(),
        description: form.description.trim().to_string(),
        pet_type: form.pet_type.clone(),
        pet_size: PetForm::optional(&form.pet_size),
        pet_color: PetForm::optional(&form.pet_color),
        pet_gender: PetForm::optional(&form.pet_gender),
        pet_age: PetForm::optional(&form.pet_age),
        latitude,
        longitude,
        address: PetForm::optional(&form.address),
        status: form.status.clone(),
        image_url: new_image.clone(),
        updated_at: now_timestamp(),
    };
    if let Err(e) = pets_repo::update_pet(pool, &pet.id, &changes).await {
        if let Some(uploaded) = new_image {
            discard_uploads(baas, actor, &[uploaded]).await;
        }
        return Err(e.into());
    }

    if let (Some(_), Some(old)) = (new_image, pet.image_url.filter(|p| !p.trim().is_empty())) {
        if let Err(e) = storage_service::remove_objects(baas, actor.access_token, PET_IMAGES_BUCKET, &[old.clone()]).await {
            warn!("Old main image {} could not be removed: {}", old, e);
        }
    }
    info!("🐾 Pet {} updated by {}", pet.id, actor.user_id);
    Ok(())
}

pub async fn change_status(
    pool: &SqlitePool,
    actor: Actor<'_>,
    pet_id: &str,
    status: &str,
) -> AppResult<()> {
    let status = PetStatus::parse(status)
        .ok_or_else(|| AppError::Validation("Estado no válido".to_string()))?;
    let pet = load_managed_pet(pool, actor, pet_id).await?;
    pets_repo::update_status(pool, &pet.id, status.as_str(), &now_timestamp()).await?;
    info!("🐾 Pet {} status -> {} by {}", pet.id, status.as_str(), actor.user_id);
    Ok(())
}

/// Removes the photos (storage failures are logged only), then the row.
pub async fn delete_pet(
    pool: &SqlitePool,
    baas: &BaasClient,
    actor: Actor<'_>,
    pet_id: &str,
) -> AppResult<()> {
    let pet = load_managed_pet(pool, actor, pet_id).await?;
    let paths = pet.all_image_paths();
    if let Err(e) = storage_service::remove_objects(baas, actor.access_token, PET_IMAGES_BUCKET, &paths).await {
        warn!("Images for pet {} could not be removed: {}", pet.id, e);
    }
    pets_repo::delete_pet(pool, &pet.id).await?;
    info!("🗑️ Pet {} deleted by {}", pet.id, actor.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaasConfig;
    use crate::database::testing::{new_pet, seed_pet, seed_profile, test_pool};
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BaasClient {
        BaasClient::new(
            reqwest::Client::new(),
            BaasConfig {
                url: server.uri(),
                anon_key: "anon-key".into(),
                service_role_key: None,
                jwt_secret: "secret".into(),
            },
        )
    }

    fn owner() -> Actor<'static> {
        Actor {
            user_id: "u1",
            is_admin: false,
            access_token: "token-u1",
        }
    }

    fn valid_form() -> PetForm {
        PetForm {
            title: "Perro perdido".into(),
            description: "Perro mediano color canela, muy amigable".into(),
            pet_type: "perro".into(),
            pet_size: "mediano".into(),
            pet_gender: "macho".into(),
            pet_age: "adulto".into(),
            pet_color: "".into(),
            address: "".into(),
            latitude: "".into(),
            longitude: "".into(),
            status: "activo".into(),
        }
    }

    fn jpeg(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }

    #[tokio::test]
    async fn create_without_images_makes_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;

        let err = create_pet(&pool, &client_for(&server), owner(), &valid_form(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Debes agregar al menos una foto de la mascota"));
        assert_eq!(pets_repo::count_pets(&pool, &PetQuery::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_reports_earliest_step_error() {
        let server = MockServer::start().await;
        let pool = test_pool().await;
        let mut form = valid_form();
        form.title = "Gato".into();
        form.latitude = "abc".into();

        let err = create_pet(&pool, &client_for(&server), owner(), &form, vec![jpeg("a.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "El título debe tener al menos 5 caracteres"));
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_photos() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pet-images/u1/\d+_(main|1)$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/pet-images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        pool.close().await;

        let err = create_pet(&pool, &client_for(&server), owner(), &valid_form(), vec![jpeg("a.jpg"), jpeg("b.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let removed = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.method.as_str() == "DELETE")
            .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap())
            .unwrap();
        let prefixes = removed["prefixes"].as_array().unwrap();
        assert_eq!(prefixes.len(), 2);
        assert!(prefixes.iter().any(|p| p.as_str().unwrap().ends_with("_main")));
    }

    #[tokio::test]
    async fn create_uploads_main_then_additional_and_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pet-images/u1/\d+_main$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pet-images/u1/\d+_1$"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pet-images/u1/\d+_2$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;

        let id = create_pet(
            &pool,
            &client_for(&server),
            owner(),
            &valid_form(),
            vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")],
        )
        .await
        .unwrap();

        let pet = pets_repo::get_pet(&pool, &id).await.unwrap().unwrap();
        assert_eq!(pet.status, "activo");
        assert!(pet.image_url.as_deref().unwrap().ends_with("_main"));
        let extra = pet.additional_image_paths();
        assert_eq!(extra.len(), 1);
        assert!(extra[0].ends_with("_2"));
    }

    #[tokio::test]
    async fn failed_main_upload_aborts_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "denied" })))
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;

        let result = create_pet(&pool, &client_for(&server), owner(), &valid_form(), vec![jpeg("a.jpg")]).await;
        assert!(matches!(result, Err(AppError::Baas(_))));
        assert_eq!(pets_repo::count_pets(&pool, &PetQuery::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_storage_objects_and_row() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/pet-images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_pet(&pool, new_pet("p1", "u1", "Gato perdido", "gato", "2024-05-01T10:00:00.000Z")).await;

        delete_pet(&pool, &client_for(&server), owner(), "p1").await.unwrap();
        assert!(pets_repo::get_pet(&pool, "p1").await.unwrap().is_none());
        assert!(load_detail_view(&pool, "http://baas", "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_still_removes_row_when_storage_fails() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_pet(&pool, new_pet("p1", "u1", "Gato perdido", "gato", "2024-05-01T10:00:00.000Z")).await;

        delete_pet(&pool, &client_for(&server), owner(), "p1").await.unwrap();
        assert!(pets_repo::get_pet(&pool, "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_manage() {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_pet(&pool, new_pet("p1", "u1", "Gato perdido", "gato", "2024-05-01T10:00:00.000Z")).await;

        let stranger = Actor { user_id: "u2", is_admin: false, access_token: "t" };
        let admin = Actor { user_id: "u3", is_admin: true, access_token: "t" };
        assert!(matches!(change_status(&pool, stranger, "p1", "adoptado").await, Err(AppError::Forbidden)));
        change_status(&pool, admin, "p1", "adoptado").await.unwrap();
        assert_eq!(pets_repo::get_pet(&pool, "p1").await.unwrap().unwrap().status, "adoptado");
        assert!(matches!(change_status(&pool, admin, "p1", "borrado").await, Err(AppError::Validation(_))));
        assert!(matches!(change_status(&pool, admin, "nope", "activo").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn update_with_new_photo_replaces_and_removes_old() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pet-images/u1/\d+_updated$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/pet-images"))
            .and(wiremock::matchers::body_json(json!({ "prefixes": ["u1/p1_main"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_pet(&pool, new_pet("p1", "u1", "Gato perdido", "gato", "2024-05-01T10:00:00.000Z")).await;

        let mut form = valid_form();
        form.status = "encontrado".into();
        update_pet(&pool, &client_for(&server), owner(), "p1", &form, vec![jpeg("new.png")])
            .await
            .unwrap();

        let pet = pets_repo::get_pet(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(pet.status, "encontrado");
        assert!(pet.image_url.unwrap().ends_with("_updated"));
    }

    #[tokio::test]
    async fn home_shows_active_only_with_counts_and_pages() {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "", "2024-01-01T00:00:00.000Z").await;
        for i in 0..8 {
            let created = format!("2024-05-{:02}T10:00:00.000Z", i + 1);
            seed_pet(&pool, new_pet(&format!("d{}", i), "u1", "Perro perdido", "perro", &created)).await;
        }
        seed_pet(&pool, new_pet("g1", "u1", "Gato perdido", "gato", "2024-04-01T10:00:00.000Z")).await;
        let mut hidden = new_pet("h1", "u1", "Conejo encontrado", "conejo", "2024-04-02T10:00:00.000Z");
        hidden.status = "encontrado".into();
        seed_pet(&pool, hidden).await;

        let view = load_home_view(&pool, "http://baas", &PetListFilter::default(), 2).await.unwrap();
        assert_eq!(view.window.total_items, 9);
        assert_eq!(view.window.total_pages, 2);
        assert_eq!(view.cards.len(), 3);
        assert_eq!(view.cards[2].id, "g1");
        assert_eq!(view.cards[0].owner_name, "Usuario");
        assert_eq!(view.counts, TypeCounts { perro: 8, gato: 1, otros: 0 });
    }

    #[tokio::test]
    async fn detail_counts_views_and_lists_similar() {
        let pool = test_pool().await;
        seed_profile(&pool, "u1", "Ana", "2024-01-01T00:00:00.000Z").await;
        seed_pet(&pool, new_pet("p1", "u1", "Perro perdido", "perro", "2024-05-01T10:00:00.000Z")).await;
        seed_pet(&pool, new_pet("p2", "u1", "Otro perro", "perro", "2024-05-02T10:00:00.000Z")).await;

        load_detail_view(&pool, "http://baas", "p1").await.unwrap();
        let view = load_detail_view(&pool, "http://baas", "p1").await.unwrap().unwrap();
        assert_eq!(view.card.views, 2);
        assert_eq!(view.card.owner_name, "Ana");
        assert_eq!(view.similar.len(), 1);
        assert_eq!(view.similar[0].id, "p2");
        assert_eq!(
            view.image_urls,
            vec!["http://baas/storage/v1/object/public/pet-images/u1/p1_main"]
        );
        assert_eq!(view.gender_label, "No especificado");
    }
}
