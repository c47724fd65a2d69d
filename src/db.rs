pub mod user_repo;
pub use user_repo::UserRepository;
pub mod otp_repo;
pub use otp_repo::OtpRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod push_repo;
pub use push_repo::PushRepository;
pub mod offline_repo;
pub use offline_repo::OfflineActionRepository;
pub mod seo_repo;
pub use seo_repo::SeoRepository;
