// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::user::{
        AdminProfile, CustomerProfile, UpdateAdminProfilePayload, UpdateCustomerProfilePayload,
        UpdateUserPayload, UpdateVendorProfilePayload, User, UserType, VendorProfile,
    },
};

const USER_COLUMNS: &str = "id, mobile, email, first_name, last_name, user_type, is_active, \
     is_staff, is_superuser, password_hash, date_joined, updated_at";

/// Fields of a user row about to be inserted.
pub struct NewUser<'a> {
    pub mobile: Option<&'a str>,
    pub email: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub user_type: UserType,
    pub is_active: bool,
    pub password_hash: Option<&'a str>,
}

/// Maps the unique indexes on `users` to their domain errors.
fn map_user_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => AppError::EmailAlreadyExists,
                Some("users_mobile_key") => AppError::MobileAlreadyExists,
                Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
                None => AppError::UniqueConstraintViolation("users".to_string()),
            };
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Users
    // ---

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_mobile(&self, mobile: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE mobile = $1"))
            .bind(mobile)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// All users, or only `owner` when scoped.
    pub async fn list(&self, owner: Option<Uuid>) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::uuid IS NULL OR id = $1) ORDER BY date_joined DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn create_user<'e, E>(&self, executor: E, new: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (mobile, email, first_name, last_name, user_type, is_active, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.mobile)
        .bind(new.email)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.user_type.as_str())
        .bind(new.is_active)
        .bind(new.password_hash)
        .fetch_one(executor)
        .await
        .map_err(map_user_conflict)
    }

    pub async fn update_user(&self, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                mobile = COALESCE($2, mobile),
                email = COALESCE($3, email),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.mobile.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.first_name.as_deref())
        .bind(payload.last_name.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_conflict)?
        .ok_or(AppError::NotFound("User"))
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User"))
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Profile creation (always inside the registration transaction)
    // ---

    pub async fn create_customer_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        address: Option<&str>,
    ) -> Result<CustomerProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, CustomerProfile>(
            "INSERT INTO customer_profiles (user_id, address) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(address)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    pub async fn create_vendor_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        business_name: &str,
        business_address: &str,
        service_areas: Option<&str>,
    ) -> Result<VendorProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, VendorProfile>(
            r#"
            INSERT INTO vendor_profiles (user_id, business_name, business_address, service_areas)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(business_name)
        .bind(business_address)
        .bind(service_areas)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    pub async fn create_admin_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        department: Option<&str>,
    ) -> Result<AdminProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, AdminProfile>(
            "INSERT INTO admin_profiles (user_id, department) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(department)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    // ---
    // Customer profiles
    // ---

    pub async fn list_customer_profiles(&self, owner: Option<Uuid>) -> Result<Vec<CustomerProfile>, AppError> {
        let rows = sqlx::query_as::<_, CustomerProfile>(
            "SELECT * FROM customer_profiles WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_customer_profile(&self, id: Uuid) -> Result<Option<CustomerProfile>, AppError> {
        let row = sqlx::query_as::<_, CustomerProfile>("SELECT * FROM customer_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_customer_profile(
        &self,
        id: Uuid,
        payload: &UpdateCustomerProfilePayload,
    ) -> Result<CustomerProfile, AppError> {
        sqlx::query_as::<_, CustomerProfile>(
            r#"
            UPDATE customer_profiles SET address = COALESCE($2, address), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.address.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Customer profile"))
    }

    pub async fn delete_customer_profile(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customer_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Vendor profiles
    // ---

    pub async fn list_vendor_profiles(&self, owner: Option<Uuid>) -> Result<Vec<VendorProfile>, AppError> {
        let rows = sqlx::query_as::<_, VendorProfile>(
            "SELECT * FROM vendor_profiles WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_vendor_profile(&self, id: Uuid) -> Result<Option<VendorProfile>, AppError> {
        let row = sqlx::query_as::<_, VendorProfile>("SELECT * FROM vendor_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_vendor_profile(
        &self,
        id: Uuid,
        payload: &UpdateVendorProfilePayload,
    ) -> Result<VendorProfile, AppError> {
        sqlx::query_as::<_, VendorProfile>(
            r#"
            UPDATE vendor_profiles SET
                business_name = COALESCE($2, business_name),
                business_address = COALESCE($3, business_address),
                service_areas = COALESCE($4, service_areas),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.business_name.as_deref())
        .bind(payload.business_address.as_deref())
        .bind(payload.service_areas.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Vendor profile"))
    }

    /// Idempotent: verifying an already verified vendor succeeds again.
    pub async fn verify_vendor_profile(&self, id: Uuid) -> Result<VendorProfile, AppError> {
        sqlx::query_as::<_, VendorProfile>(
            "UPDATE vendor_profiles SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Vendor profile"))
    }

    pub async fn delete_vendor_profile(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vendor_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Admin profiles
    // ---

    pub async fn list_admin_profiles(&self, owner: Option<Uuid>) -> Result<Vec<AdminProfile>, AppError> {
        let rows = sqlx::query_as::<_, AdminProfile>(
            "SELECT * FROM admin_profiles WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_admin_profile(&self, id: Uuid) -> Result<Option<AdminProfile>, AppError> {
        let row = sqlx::query_as::<_, AdminProfile>("SELECT * FROM admin_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_admin_profile(
        &self,
        id: Uuid,
        payload: &UpdateAdminProfilePayload,
    ) -> Result<AdminProfile, AppError> {
        sqlx::query_as::<_, AdminProfile>(
            r#"
            UPDATE admin_profiles SET department = COALESCE($2, department), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.department.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Admin profile"))
    }

    pub async fn delete_admin_profile(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
