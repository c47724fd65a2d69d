// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub codename: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role plus the permissions bound to it.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminRoleResponse {
    pub id: Uuid,
    pub user: User,
    pub role: RoleResponse,
    pub assigned_by: Option<User>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionPayload {
    #[validate(length(min = 1, max = 100, message = "The name is required (max 100 characters)."))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "The codename is required (max 100 characters)."))]
    pub codename: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 100, message = "The name is required (max 100 characters)."))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

/// Partial update; `permission_ids`, when present, replaces the whole set.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, max = 100, message = "The name must have 1 to 100 characters."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub permission_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignAdminRolePayload {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdminRolePayload {
    pub role_id: Uuid,
}

fn default_true() -> bool {
    true
}
