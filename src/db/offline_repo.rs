// src/db/offline_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pwa::{OfflineAction, OfflineActionPayload},
    services::offline_sync::OfflineActionStore,
};

#[derive(Clone)]
pub struct OfflineActionRepository {
    pool: PgPool,
}

impl OfflineActionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OfflineAction>, AppError> {
        let rows = sqlx::query_as::<_, OfflineAction>(
            "SELECT * FROM offline_actions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<OfflineAction>, AppError> {
        let row = sqlx::query_as::<_, OfflineAction>(
            "SELECT * FROM offline_actions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, user_id: Uuid, payload: &OfflineActionPayload) -> Result<OfflineAction, AppError> {
        let row = sqlx::query_as::<_, OfflineAction>(
            r#"
            INSERT INTO offline_actions (user_id, action_type, resource_type, resource_id, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(payload.action_type.as_str())
        .bind(&payload.resource_type)
        .bind(payload.resource_id.as_deref())
        .bind(&payload.data)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_for_user(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM offline_actions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OfflineActionStore for OfflineActionRepository {
    async fn pending_for(&self, user_id: Uuid) -> Result<Vec<OfflineAction>, AppError> {
        let rows = sqlx::query_as::<_, OfflineAction>(
            r#"
            SELECT * FROM offline_actions
            WHERE user_id = $1 AND synced = FALSE
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_synced(&self, action_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        // A concurrent sync that got here first wins; this one reports false
        let result = sqlx::query(
            "UPDATE offline_actions SET synced = TRUE, synced_at = $2 WHERE id = $1 AND synced = FALSE",
        )
        .bind(action_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
