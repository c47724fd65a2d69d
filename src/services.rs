pub mod auth;
pub mod offline_sync;
pub mod otp;
pub mod push;
pub mod rbac_service;
pub mod seo;
pub mod sms;
pub mod user_service;
pub mod web_push_gateway;
