// src/db/seo_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pwa::{SeoMetadata, SeoQuery, SitemapEntry, SitemapEntryPayload},
};

#[derive(Clone)]
pub struct SeoRepository {
    pool: PgPool,
}

impl SeoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // SEO metadata (read-only over HTTP)
    // ---

    pub async fn list_metadata(&self, query: &SeoQuery) -> Result<Vec<SeoMetadata>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM seo_metadata WHERE TRUE");
        if let Some(page_type) = query.page_type.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND page_type = ").push_bind(page_type.to_string());
        }
        if let Some(identifier) = query.page_identifier.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND page_identifier = ").push_bind(identifier.to_string());
        }
        qb.push(" ORDER BY page_type, page_identifier NULLS FIRST");

        let rows = qb.build_query_as::<SeoMetadata>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_metadata(&self, id: Uuid) -> Result<Option<SeoMetadata>, AppError> {
        let row = sqlx::query_as::<_, SeoMetadata>("SELECT * FROM seo_metadata WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // ---
    // Sitemap entries
    // ---

    pub async fn list_sitemap_entries(&self) -> Result<Vec<SitemapEntry>, AppError> {
        let rows = sqlx::query_as::<_, SitemapEntry>(
            "SELECT * FROM sitemap_entries ORDER BY priority DESC, url ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_sitemap_entry(&self, id: Uuid) -> Result<Option<SitemapEntry>, AppError> {
        let row = sqlx::query_as::<_, SitemapEntry>("SELECT * FROM sitemap_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_sitemap_entry(&self, payload: &SitemapEntryPayload) -> Result<SitemapEntry, AppError> {
        sqlx::query_as::<_, SitemapEntry>(
            r#"
            INSERT INTO sitemap_entries (url, priority, changefreq)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.url)
        .bind(payload.priority)
        .bind(payload.changefreq.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A sitemap entry with this URL already exists."))
    }

    pub async fn update_sitemap_entry(
        &self,
        id: Uuid,
        payload: &SitemapEntryPayload,
    ) -> Result<SitemapEntry, AppError> {
        sqlx::query_as::<_, SitemapEntry>(
            r#"
            UPDATE sitemap_entries SET url = $2, priority = $3, changefreq = $4, last_modified = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.url)
        .bind(payload.priority)
        .bind(payload.changefreq.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A sitemap entry with this URL already exists."))?
        .ok_or(AppError::NotFound("Sitemap entry"))
    }

    pub async fn delete_sitemap_entry(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sitemap_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drops every entry and inserts `entries` in one transaction.
    pub async fn replace_sitemap_entries(&self, entries: &[SitemapEntryPayload]) -> Result<Vec<SitemapEntry>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sitemap_entries").execute(&mut *tx).await?;

        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, SitemapEntry>(
                "INSERT INTO sitemap_entries (url, priority, changefreq) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(&entry.url)
            .bind(entry.priority)
            .bind(entry.changefreq.as_str())
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
