// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        policy::{authorize, Action, Resource},
    },
    models::rbac::{
        AssignAdminRolePayload, CreateRolePayload, PermissionPayload, UpdateAdminRolePayload, UpdateRolePayload,
    },
};

// ---
// Permissions
// ---

// GET /api/roles/permissions
pub async fn list_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Permissions, Action::Read)?;

    let permissions = app_state.rbac_service.repo().list_permissions().await?;

    Ok((StatusCode::OK, Json(permissions)))
}

// GET /api/roles/permissions/{id}
pub async fn get_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Permissions, Action::Read)?;

    let permission = app_state
        .rbac_service
        .repo()
        .find_permission(id)
        .await?
        .ok_or(AppError::NotFound("Permission"))?;

    Ok((StatusCode::OK, Json(permission)))
}

// POST /api/roles/permissions
pub async fn create_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Permissions, Action::Create)?;
    payload.validate()?;

    let permission = app_state.rbac_service.repo().create_permission(&payload).await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

// PUT /api/roles/permissions/{id}
pub async fn update_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Permissions, Action::Update)?;
    payload.validate()?;

    let permission = app_state.rbac_service.repo().update_permission(id, &payload).await?;

    Ok((StatusCode::OK, Json(permission)))
}

// DELETE /api/roles/permissions/{id}
pub async fn delete_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Permissions, Action::Delete)?;

    if !app_state.rbac_service.repo().delete_permission(id).await? {
        return Err(AppError::NotFound("Permission"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Roles
// ---

// GET /api/roles/roles
pub async fn list_roles(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Read)?;

    let roles = app_state.rbac_service.list_roles().await?;

    Ok((StatusCode::OK, Json(roles)))
}

// GET /api/roles/roles/{id}
pub async fn get_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Read)?;

    let role = app_state.rbac_service.get_role(id).await?;

    Ok((StatusCode::OK, Json(role)))
}

// POST /api/roles/roles
pub async fn create_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Create)?;
    payload.validate()?;

    let role = app_state.rbac_service.create_role(payload).await?;

    Ok((StatusCode::CREATED, Json(role)))
}

// PATCH /api/roles/roles/{id}
pub async fn update_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Update)?;
    payload.validate()?;

    let role = app_state.rbac_service.update_role(id, payload).await?;

    Ok((StatusCode::OK, Json(role)))
}

// DELETE /api/roles/roles/{id}
pub async fn delete_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Delete)?;

    if !app_state.rbac_service.repo().delete_role(id).await? {
        return Err(AppError::NotFound("Role"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/roles/roles/{id}/activate
pub async fn activate_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Activate)?;

    let role = app_state.rbac_service.set_role_active(id, true).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Role {} activated successfully", role.name) })),
    ))
}

// POST /api/roles/roles/{id}/deactivate
pub async fn deactivate_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Roles, Action::Activate)?;

    let role = app_state.rbac_service.set_role_active(id, false).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Role {} deactivated successfully", role.name) })),
    ))
}

// ---
// Admin role assignments
// ---

// GET /api/roles/admin-roles
pub async fn list_admin_roles(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminRoles, Action::Read)?;

    let rows = app_state.rbac_service.list_admin_roles().await?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/roles/admin-roles/{id}
pub async fn get_admin_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminRoles, Action::Read)?;

    let row = app_state.rbac_service.get_admin_role(id).await?;

    Ok((StatusCode::OK, Json(row)))
}

// POST /api/roles/admin-roles
pub async fn assign_admin_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AssignAdminRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminRoles, Action::Create)?;

    let row = app_state
        .rbac_service
        .assign_admin_role(&user, payload.user_id, payload.role_id)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

// PATCH /api/roles/admin-roles/{id}
pub async fn update_admin_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdminRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminRoles, Action::Update)?;

    let row = app_state.rbac_service.reassign_admin_role(&user, id, payload.role_id).await?;

    Ok((StatusCode::OK, Json(row)))
}

// DELETE /api/roles/admin-roles/{id}
pub async fn delete_admin_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminRoles, Action::Delete)?;

    if !app_state.rbac_service.repo().delete_admin_role(id).await? {
        return Err(AppError::NotFound("Admin role"));
    }

    Ok(StatusCode::NO_CONTENT)
}
