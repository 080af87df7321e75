pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod location;
pub mod my_pets;
pub mod pets;
pub mod profile;
pub mod theme;
