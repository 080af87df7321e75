#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetRow {
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
    pub additional_images: String, // JSON array of storage paths
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub status: String,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl PetRow {
    pub fn additional_image_paths(&self) -> Vec<String> {
        serde_json::from_str::<Vec<String>>(self.additional_images.trim())
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    /// Main image first, then the additional ones.
    pub fn all_image_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if let Some(main) = self.image_url.as_ref().filter(|s| !s.trim().is_empty()) {
            paths.push(main.clone());
        }
        paths.extend(self.additional_image_paths());
        paths
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetWithOwnerRow {
    #[sqlx(flatten)]
    pub pet: PetRow,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SimilarPetRow {
    pub id: String,
    pub title: String,
    pub pet_type: String,
    pub image_url: Option<String>,
}
