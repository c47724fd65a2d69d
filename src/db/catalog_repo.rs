// src/db/catalog_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{
        CatalogQuery, CategoryPayload, PaymentTerm, PaymentTermPayload, Service, ServiceCategory,
        ServicePayload, Tax, TaxPayload, UpdateCategoryPayload, UpdatePaymentTermPayload,
        UpdateServicePayload, UpdateTaxPayload,
    },
};

const SERVICE_SELECT: &str = r#"
    SELECT s.id, s.category_id, c.name AS category_name, s.name, s.description,
           s.price, s.duration_minutes, s.is_active, s.created_at, s.updated_at
    FROM services s
    JOIN service_categories c ON c.id = s.category_id
"#;

/// Appends the `is_active` and free-text filters shared by every catalog list.
fn push_common_filters<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    query: &CatalogQuery,
    active_column: &str,
    search_columns: &[&str],
) {
    if let Some(active) = query.active_filter() {
        qb.push(format!(" AND {active_column} = ")).push_bind(active);
    }

    if let Some(pattern) = query.search_pattern() {
        qb.push(" AND (");
        for (i, column) in search_columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{column} ILIKE ")).push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

fn map_category_reference(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::BadRequest("The selected category does not exist.".to_string());
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Categories
    // ---

    pub async fn list_categories(&self, query: &CatalogQuery) -> Result<Vec<ServiceCategory>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM service_categories WHERE TRUE");
        push_common_filters(&mut qb, query, "is_active", &["name", "description"]);
        qb.push(" ORDER BY ").push(query.order_by(
            &[("name", "name"), ("created_at", "created_at")],
            "name ASC",
        ));

        let rows = qb.build_query_as::<ServiceCategory>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError> {
        let row = sqlx::query_as::<_, ServiceCategory>("SELECT * FROM service_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<ServiceCategory, AppError> {
        let row = sqlx::query_as::<_, ServiceCategory>(
            r#"
            INSERT INTO service_categories (name, description, is_active)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        payload: &UpdateCategoryPayload,
    ) -> Result<ServiceCategory, AppError> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            UPDATE service_categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Category"))
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM service_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Services
    // ---

    pub async fn list_services(&self, query: &CatalogQuery) -> Result<Vec<Service>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(SERVICE_SELECT);
        qb.push(" WHERE TRUE");
        push_common_filters(&mut qb, query, "s.is_active", &["s.name", "s.description", "c.name"]);

        if let Some(category_id) = query.category_id {
            qb.push(" AND s.category_id = ").push_bind(category_id);
        }

        qb.push(" ORDER BY ").push(query.order_by(
            &[
                ("name", "s.name"),
                ("price", "s.price"),
                ("duration_minutes", "s.duration_minutes"),
                ("created_at", "s.created_at"),
            ],
            "s.name ASC",
        ));

        let rows = qb.build_query_as::<Service>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, Service>(&format!("{SERVICE_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_service(&self, payload: &ServicePayload) -> Result<Service, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO services (category_id, name, description, price, duration_minutes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(payload.category_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_category_reference)?;

        self.find_service(id).await?.ok_or(AppError::NotFound("Service"))
    }

    pub async fn update_service(&self, id: Uuid, payload: &UpdateServicePayload) -> Result<Service, AppError> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE services SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                duration_minutes = COALESCE($6, duration_minutes),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(payload.category_id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_category_reference)?;

        match updated {
            Some(id) => self.find_service(id).await?.ok_or(AppError::NotFound("Service")),
            None => Err(AppError::NotFound("Service")),
        }
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Taxes
    // ---

    pub async fn list_taxes(&self, query: &CatalogQuery) -> Result<Vec<Tax>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM taxes WHERE TRUE");
        push_common_filters(&mut qb, query, "is_active", &["name"]);
        qb.push(" ORDER BY ").push(query.order_by(&[("name", "name"), ("rate", "rate")], "name ASC"));

        let rows = qb.build_query_as::<Tax>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_tax(&self, id: Uuid) -> Result<Option<Tax>, AppError> {
        let row = sqlx::query_as::<_, Tax>("SELECT * FROM taxes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_tax(&self, payload: &TaxPayload) -> Result<Tax, AppError> {
        let row = sqlx::query_as::<_, Tax>(
            "INSERT INTO taxes (name, rate, is_active) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&payload.name)
        .bind(payload.rate)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_tax(&self, id: Uuid, payload: &UpdateTaxPayload) -> Result<Tax, AppError> {
        sqlx::query_as::<_, Tax>(
            r#"
            UPDATE taxes SET
                name = COALESCE($2, name),
                rate = COALESCE($3, rate),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.rate)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Tax"))
    }

    pub async fn delete_tax(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM taxes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Payment terms
    // ---

    pub async fn list_payment_terms(&self, query: &CatalogQuery) -> Result<Vec<PaymentTerm>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM payment_terms WHERE TRUE");
        push_common_filters(&mut qb, query, "is_active", &["name", "description"]);
        qb.push(" ORDER BY ").push(query.order_by(&[("name", "name"), ("days", "days")], "days ASC"));

        let rows = qb.build_query_as::<PaymentTerm>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_payment_term(&self, id: Uuid) -> Result<Option<PaymentTerm>, AppError> {
        let row = sqlx::query_as::<_, PaymentTerm>("SELECT * FROM payment_terms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_payment_term(&self, payload: &PaymentTermPayload) -> Result<PaymentTerm, AppError> {
        let row = sqlx::query_as::<_, PaymentTerm>(
            r#"
            INSERT INTO payment_terms (name, days, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.days)
        .bind(&payload.description)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_payment_term(
        &self,
        id: Uuid,
        payload: &UpdatePaymentTermPayload,
    ) -> Result<PaymentTerm, AppError> {
        sqlx::query_as::<_, PaymentTerm>(
            r#"
            UPDATE payment_terms SET
                name = COALESCE($2, name),
                days = COALESCE($3, days),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.days)
        .bind(payload.description.as_deref())
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Payment term"))
    }

    pub async fn delete_payment_term(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM payment_terms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
