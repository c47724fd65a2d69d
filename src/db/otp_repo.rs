// src/db/otp_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{common::error::AppError, models::auth::OneTimePasscode, services::otp::OtpStore};

#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for OtpRepository {
    async fn replace(
        &self,
        mobile: &str,
        code: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<OneTimePasscode, AppError> {
        // The unique index on mobile turns this into "drop the old code, keep the new one"
        let otp = sqlx::query_as::<_, OneTimePasscode>(
            r#"
            INSERT INTO otps (mobile, code, is_verified, created_at, expires_at)
            VALUES ($1, $2, FALSE, $3, $4)
            ON CONFLICT (mobile) DO UPDATE SET
                id = gen_random_uuid(),
                code = EXCLUDED.code,
                is_verified = FALSE,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            RETURNING id, mobile, code, is_verified, created_at, expires_at
            "#,
        )
        .bind(mobile)
        .bind(code)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(otp)
    }

    async fn consume(&self, mobile: &str, code: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let consumed: Option<uuid::Uuid> = sqlx::query_scalar(
            r#"
            UPDATE otps SET is_verified = TRUE
            WHERE mobile = $1 AND code = $2 AND is_verified = FALSE AND expires_at > $3
            RETURNING id
            "#,
        )
        .bind(mobile)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(consumed.is_some())
    }
}
