// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::rbac::{AdminRole, Permission, PermissionPayload, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Permissions
    // ---

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, codename, description FROM permissions ORDER BY codename",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    pub async fn find_permission(&self, id: Uuid) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, codename, description FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    pub async fn create_permission(&self, payload: &PermissionPayload) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (name, codename, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, codename, description
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.codename)
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A permission with this name or codename already exists."))
    }

    pub async fn update_permission(&self, id: Uuid, payload: &PermissionPayload) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions SET name = $2, codename = $3, description = $4
            WHERE id = $1
            RETURNING id, name, codename, description
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.codename)
        .bind(&payload.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A permission with this name or codename already exists."))?
        .ok_or(AppError::NotFound("Permission"))
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolves ids to rows; unknown ids are simply absent from the result.
    pub async fn find_permissions_by_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, codename, description FROM permissions WHERE id = ANY($1) ORDER BY codename",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    // ---
    // Roles
    // ---

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn find_role<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: &str,
        is_active: bool,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, is_active)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A role with this name already exists."))
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A role with this name already exists."))
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set semantics: the role ends up bound to exactly `permission_ids`.
    pub async fn replace_role_permissions(
        &self,
        conn: &mut sqlx::PgConnection,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *conn)
            .await?;

        if !permission_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, unnest($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn permissions_for_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.codename, p.description
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.codename
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    // ---
    // Admin role assignments
    // ---

    pub async fn list_admin_roles(&self) -> Result<Vec<AdminRole>, AppError> {
        let rows = sqlx::query_as::<_, AdminRole>("SELECT * FROM admin_roles ORDER BY assigned_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_admin_role(&self, id: Uuid) -> Result<Option<AdminRole>, AppError> {
        let row = sqlx::query_as::<_, AdminRole>("SELECT * FROM admin_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create_admin_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Uuid,
    ) -> Result<AdminRole, AppError> {
        sqlx::query_as::<_, AdminRole>(
            r#"
            INSERT INTO admin_roles (user_id, role_id, assigned_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(assigned_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "This admin already has a role assigned."))
    }

    pub async fn update_admin_role(
        &self,
        id: Uuid,
        role_id: Uuid,
        assigned_by: Uuid,
    ) -> Result<AdminRole, AppError> {
        sqlx::query_as::<_, AdminRole>(
            r#"
            UPDATE admin_roles SET role_id = $2, assigned_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role_id)
        .bind(assigned_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Admin role"))
    }

    pub async fn delete_admin_role(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
