#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}
