pub mod auth;
pub mod catalog;
pub mod pwa;
pub mod rbac;
pub mod user;
