pub mod auth;
pub mod files;
pub mod folders;
pub mod health;
pub mod types;
pub mod users;
