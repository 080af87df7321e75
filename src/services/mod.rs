pub mod account_service;
pub mod admin_service;
pub mod admin_tools_service;
pub mod auth_service;
pub mod baas;
pub mod dashboard_service;
pub mod display;
pub mod listing;
pub mod location_service;
pub mod my_pets_service;
pub mod pet_form;
pub mod pets_service;
pub mod profile_service;
pub mod storage_service;

/// Who is performing a mutation.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user_id: &'a str,
    pub is_admin: bool,
    /// Session token, forwarded to storage so its policies see the user.
    pub access_token: &'a str,
}
