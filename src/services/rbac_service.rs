// src/services/rbac_service.rs

use std::collections::BTreeSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, UserRepository},
    models::{
        rbac::{AdminRole, AdminRoleResponse, CreateRolePayload, Role, RoleResponse, UpdateRolePayload},
        user::{User, UserType},
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    pub fn repo(&self) -> &RbacRepository {
        &self.repo
    }

    // ---
    // Roles
    // ---

    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles().await?;
        let mut responses = Vec::with_capacity(roles.len());
        for role in roles {
            responses.push(self.with_permissions(role).await?);
        }
        Ok(responses)
    }

    pub async fn get_role(&self, id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self.repo.find_role(&self.pool, id).await?.ok_or(AppError::NotFound("Role"))?;
        self.with_permissions(role).await
    }

    pub async fn create_role(&self, payload: CreateRolePayload) -> Result<RoleResponse, AppError> {
        let permission_ids = dedup(&payload.permission_ids);

        // 1. Open the transaction
        let mut tx = self.pool.begin().await?;

        // 2. Reject unknown permission ids before touching anything
        let permissions = self.repo.find_permissions_by_ids(&mut *tx, &permission_ids).await?;
        ensure_all_found(&permission_ids, permissions.len())?;

        // 3. Role + bindings
        let role = self
            .repo
            .create_role(&mut *tx, payload.name.trim(), &payload.description, payload.is_active)
            .await?;
        self.repo.replace_role_permissions(&mut tx, role.id, &permission_ids).await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!(role_id = %role.id, permissions = permissions.len(), "role created");
        Ok(RoleResponse { role, permissions })
    }

    pub async fn update_role(&self, id: Uuid, payload: UpdateRolePayload) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self
            .repo
            .update_role(
                &mut *tx,
                id,
                payload.name.as_deref().map(str::trim),
                payload.description.as_deref(),
                payload.is_active,
            )
            .await?
            .ok_or(AppError::NotFound("Role"))?;

        if let Some(ids) = payload.permission_ids.as_deref() {
            let permission_ids = dedup(ids);
            let found = self.repo.find_permissions_by_ids(&mut *tx, &permission_ids).await?;
            ensure_all_found(&permission_ids, found.len())?;
            self.repo.replace_role_permissions(&mut tx, role.id, &permission_ids).await?;
        }

        let permissions = self.repo.permissions_for_role(&mut *tx, role.id).await?;
        tx.commit().await?;

        Ok(RoleResponse { role, permissions })
    }

    pub async fn set_role_active(&self, id: Uuid, is_active: bool) -> Result<Role, AppError> {
        self.repo
            .update_role(&self.pool, id, None, None, Some(is_active))
            .await?
            .ok_or(AppError::NotFound("Role"))
    }

    async fn with_permissions(&self, role: Role) -> Result<RoleResponse, AppError> {
        let permissions = self.repo.permissions_for_role(&self.pool, role.id).await?;
        Ok(RoleResponse { role, permissions })
    }

    // ---
    // Admin role assignments
    // ---

    pub async fn list_admin_roles(&self) -> Result<Vec<AdminRoleResponse>, AppError> {
        let rows = self.repo.list_admin_roles().await?;
        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            responses.push(self.expand(row).await?);
        }
        Ok(responses)
    }

    pub async fn get_admin_role(&self, id: Uuid) -> Result<AdminRoleResponse, AppError> {
        let row = self.repo.find_admin_role(id).await?.ok_or(AppError::NotFound("Admin role"))?;
        self.expand(row).await
    }

    /// Only admin users can hold a role; the caller is recorded as the assigner.
    pub async fn assign_admin_role(
        &self,
        caller: &User,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<AdminRoleResponse, AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("The selected user does not exist.".into()))?;
        if user.user_type != UserType::Admin {
            return Err(AppError::BadRequest("Roles can only be assigned to admin users.".into()));
        }
        self.ensure_role_exists(role_id).await?;

        let row = self.repo.create_admin_role(user_id, role_id, caller.id).await?;
        tracing::info!(user_id = %user_id, role_id = %role_id, by = %caller.id, "admin role assigned");
        self.expand(row).await
    }

    pub async fn reassign_admin_role(
        &self,
        caller: &User,
        id: Uuid,
        role_id: Uuid,
    ) -> Result<AdminRoleResponse, AppError> {
        self.ensure_role_exists(role_id).await?;
        let row = self.repo.update_admin_role(id, role_id, caller.id).await?;
        self.expand(row).await
    }

    async fn ensure_role_exists(&self, role_id: Uuid) -> Result<(), AppError> {
        match self.repo.find_role(&self.pool, role_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest("The selected role does not exist.".into())),
        }
    }

    async fn expand(&self, row: AdminRole) -> Result<AdminRoleResponse, AppError> {
        let user = self.user_repo.find_by_id(row.user_id).await?.ok_or(AppError::NotFound("User"))?;
        let role = self.get_role(row.role_id).await?;
        let assigned_by = match row.assigned_by {
            Some(id) => self.user_repo.find_by_id(id).await?,
            None => None,
        };

        Ok(AdminRoleResponse {
            id: row.id,
            user,
            role,
            assigned_by,
            assigned_at: row.assigned_at,
            updated_at: row.updated_at,
        })
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn ensure_all_found(requested: &[Uuid], found: usize) -> Result<(), AppError> {
    if found != requested.len() {
        return Err(AppError::BadRequest("One or more permission ids do not exist.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_permission_ids_collapse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ids = dedup(&[a, b, a, a]);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }

    #[test]
    fn unknown_permission_ids_are_a_bad_request() {
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        assert!(ensure_all_found(&ids, 2).is_ok());
        assert!(matches!(ensure_all_found(&ids, 1), Err(AppError::BadRequest(_))));
    }
}
