// src/db/push_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pwa::{PushSubscription, PushSubscriptionPayload},
    services::push::PushSubscriptionStore,
};

#[derive(Clone)]
pub struct PushRepository {
    pool: PgPool,
}

impl PushRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, AppError> {
        let rows = sqlx::query_as::<_, PushSubscription>(
            "SELECT * FROM push_subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<PushSubscription>, AppError> {
        let row = sqlx::query_as::<_, PushSubscription>(
            "SELECT * FROM push_subscriptions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Registering an endpoint the user already has refreshes its keys.
    pub async fn upsert(&self, user_id: Uuid, payload: &PushSubscriptionPayload) -> Result<PushSubscription, AppError> {
        let row = sqlx::query_as::<_, PushSubscription>(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, endpoint) DO UPDATE SET
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&payload.endpoint)
        .bind(&payload.p256dh)
        .bind(&payload.auth)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PushSubscriptionStore for PushRepository {
    async fn subscriptions_for(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, AppError> {
        self.list_for_user(user_id).await
    }

    async fn remove(&self, subscription_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = $1")
            .bind(subscription_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
