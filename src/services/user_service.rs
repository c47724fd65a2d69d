// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{user_repo::NewUser, UserRepository},
    models::user::{
        RegisterAdminPayload, RegisterCustomerPayload, RegisterVendorPayload, RegistrationResponse,
        User, UserType, VendorProfile,
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    /// Creates the user and its customer profile atomically. Expects a normalized payload.
    pub async fn register_customer(&self, payload: RegisterCustomerPayload) -> Result<RegistrationResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    mobile: payload.mobile.as_deref(),
                    email: payload.email.as_deref(),
                    first_name: payload.first_name.as_deref().unwrap_or_default(),
                    last_name: payload.last_name.as_deref().unwrap_or_default(),
                    user_type: UserType::Customer,
                    is_active: true,
                    password_hash: None,
                },
            )
            .await?;

        self.user_repo
            .create_customer_profile(&mut *tx, user.id, payload.address.as_deref())
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, "customer registered");
        Ok(registration_response("Customer registered successfully", user))
    }

    /// Creates the user and an unverified vendor profile atomically. Expects a normalized payload.
    pub async fn register_vendor(&self, payload: RegisterVendorPayload) -> Result<RegistrationResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    mobile: payload.mobile.as_deref(),
                    email: payload.email.as_deref(),
                    first_name: &payload.first_name,
                    last_name: &payload.last_name,
                    user_type: UserType::Vendor,
                    is_active: true,
                    password_hash: None,
                },
            )
            .await?;

        self.user_repo
            .create_vendor_profile(
                &mut *tx,
                user.id,
                &payload.business_name,
                &payload.business_address,
                payload.service_areas.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, "vendor registered");
        Ok(registration_response("Vendor registered successfully", user))
    }

    /// Admin accounts start inactive until a superuser activates them.
    pub async fn register_admin(
        &self,
        caller: &User,
        payload: RegisterAdminPayload,
    ) -> Result<RegistrationResponse, AppError> {
        // Hashing happens before the transaction opens
        let password_hash = hash_password(&payload.password).await?;
        let department = payload.department.as_deref().map(str::trim).filter(|d| !d.is_empty());

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    mobile: None,
                    email: Some(payload.email.trim()),
                    first_name: payload.first_name.trim(),
                    last_name: payload.last_name.trim(),
                    user_type: UserType::Admin,
                    is_active: false,
                    password_hash: Some(&password_hash),
                },
            )
            .await?;

        self.user_repo.create_admin_profile(&mut *tx, user.id, department).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, created_by = %caller.id, "admin account created (inactive)");
        Ok(registration_response("Admin registered successfully (pending activation)", user))
    }

    pub async fn set_active(&self, caller: &User, user_id: Uuid, is_active: bool) -> Result<User, AppError> {
        let user = self.user_repo.set_active(user_id, is_active).await?;
        tracing::info!(user_id = %user.id, by = %caller.id, is_active, "user activation changed");
        Ok(user)
    }

    pub async fn verify_vendor(&self, caller: &User, profile_id: Uuid) -> Result<VendorProfile, AppError> {
        let profile = self.user_repo.verify_vendor_profile(profile_id).await?;
        tracing::info!(profile_id = %profile.id, by = %caller.id, "vendor verified");
        Ok(profile)
    }
}

fn registration_response(message: &str, user: User) -> RegistrationResponse {
    RegistrationResponse {
        message: message.to_string(),
        user_id: user.id,
        mobile: user.mobile,
        email: user.email,
    }
}
