// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
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
    models::user::{
        ProfileResponse, RegisterAdminPayload, RegisterCustomerPayload, RegisterVendorPayload,
        UpdateAdminProfilePayload, UpdateCustomerProfilePayload, UpdateUserPayload, UpdateVendorProfilePayload, User,
    },
};

// ---
// Registration
// ---

// POST /api/users/register/customer
pub async fn register_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized()?;
    let response = app_state.user_service.register_customer(payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/users/register/vendor
pub async fn register_vendor(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterVendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized()?;
    let response = app_state.user_service.register_vendor(payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/users/register/admin
pub async fn register_admin(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RegisterAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::AdminAccounts, Action::Create)
        .map_err(|_| AppError::Forbidden("Only super admins can create admin accounts".into()))?;
    payload.validate()?;

    let response = app_state.user_service.register_admin(&user, payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// ---
// Users
// ---

// GET /api/users/users
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::Users, Action::Read)?;
    let users = app_state.user_repo.list(access.owner_filter(&user)).await?;

    Ok((StatusCode::OK, Json(users)))
}

// GET /api/users/users/me
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(user)))
}

// GET /api/users/users/{id}
pub async fn get_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::Users, Action::Read)?;
    if !access.permits(&user, id) {
        return Err(AppError::NotFound("User"));
    }

    let found = app_state.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound("User"))?;

    Ok((StatusCode::OK, Json(found)))
}

// PATCH /api/users/users/{id}
pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::Users, Action::Update)?;
    if !access.permits(&user, id) {
        return Err(AppError::NotFound("User"));
    }
    payload.validate()?;

    let updated = app_state.user_repo.update_user(id, &payload).await?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/users/users/{id}
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::Users, Action::Delete)?;
    if !access.permits(&user, id) || !app_state.user_repo.delete_user(id).await? {
        return Err(AppError::NotFound("User"));
    }

    tracing::info!(user_id = %id, by = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/users/users/{id}/activate
pub async fn activate_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    set_user_active(app_state, user, id, true).await
}

// POST /api/users/users/{id}/deactivate
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    set_user_active(app_state, user, id, false).await
}

async fn set_user_active(
    app_state: AppState,
    user: User,
    id: Uuid,
    is_active: bool,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    authorize(Some(&user), Resource::Users, Action::Activate)?;

    let updated = app_state.user_service.set_active(&user, id, is_active).await?;
    let verb = if is_active { "activated" } else { "deactivated" };

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("User {} {} successfully", updated.id, verb) })),
    ))
}

// ---
// Profiles
// ---

async fn with_owner<P: Serialize>(
    app_state: &AppState,
    profile: P,
    owner_id: Uuid,
) -> Result<ProfileResponse<P>, AppError> {
    let user = app_state.user_repo.find_by_id(owner_id).await?.ok_or(AppError::NotFound("User"))?;
    Ok(ProfileResponse { profile, user })
}

// GET /api/users/customer-profiles
pub async fn list_customer_profiles(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::CustomerProfiles, Action::Read)?;

    let mut responses = Vec::new();
    for profile in app_state.user_repo.list_customer_profiles(access.owner_filter(&user)).await? {
        let owner = profile.user_id;
        responses.push(with_owner(&app_state, profile, owner).await?);
    }

    Ok((StatusCode::OK, Json(responses)))
}

// GET /api/users/customer-profiles/{id}
pub async fn get_customer_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::CustomerProfiles, Action::Read)?;

    let profile = app_state
        .user_repo
        .find_customer_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Customer profile"))?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// PATCH /api/users/customer-profiles/{id}
pub async fn update_customer_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::CustomerProfiles, Action::Update)?;
    payload.validate()?;

    app_state
        .user_repo
        .find_customer_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Customer profile"))?;

    let profile = app_state.user_repo.update_customer_profile(id, &payload).await?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// DELETE /api/users/customer-profiles/{id}
pub async fn delete_customer_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::CustomerProfiles, Action::Delete)?;

    app_state
        .user_repo
        .find_customer_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Customer profile"))?;

    if !app_state.user_repo.delete_customer_profile(id).await? {
        return Err(AppError::NotFound("Customer profile"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users/vendor-profiles
pub async fn list_vendor_profiles(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::VendorProfiles, Action::Read)?;

    let mut responses = Vec::new();
    for profile in app_state.user_repo.list_vendor_profiles(access.owner_filter(&user)).await? {
        let owner = profile.user_id;
        responses.push(with_owner(&app_state, profile, owner).await?);
    }

    Ok((StatusCode::OK, Json(responses)))
}

// GET /api/users/vendor-profiles/{id}
pub async fn get_vendor_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::VendorProfiles, Action::Read)?;

    let profile = app_state
        .user_repo
        .find_vendor_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Vendor profile"))?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// PATCH /api/users/vendor-profiles/{id}
pub async fn update_vendor_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVendorProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::VendorProfiles, Action::Update)?;
    payload.validate()?;

    app_state
        .user_repo
        .find_vendor_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Vendor profile"))?;

    let profile = app_state.user_repo.update_vendor_profile(id, &payload).await?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// DELETE /api/users/vendor-profiles/{id}
pub async fn delete_vendor_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::VendorProfiles, Action::Delete)?;

    app_state
        .user_repo
        .find_vendor_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Vendor profile"))?;

    if !app_state.user_repo.delete_vendor_profile(id).await? {
        return Err(AppError::NotFound("Vendor profile"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET|POST /api/users/vendor-profiles/{id}/verify
pub async fn verify_vendor(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::VendorProfiles, Action::Verify)?;

    let profile = app_state.user_service.verify_vendor(&user, id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Vendor {} verified successfully", profile.id) })),
    ))
}

// GET /api/users/admin-profiles
pub async fn list_admin_profiles(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::AdminProfiles, Action::Read)?;

    let mut responses = Vec::new();
    for profile in app_state.user_repo.list_admin_profiles(access.owner_filter(&user)).await? {
        let owner = profile.user_id;
        responses.push(with_owner(&app_state, profile, owner).await?);
    }

    Ok((StatusCode::OK, Json(responses)))
}

// GET /api/users/admin-profiles/{id}
pub async fn get_admin_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::AdminProfiles, Action::Read)?;

    let profile = app_state
        .user_repo
        .find_admin_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Admin profile"))?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// PATCH /api/users/admin-profiles/{id}
pub async fn update_admin_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdminProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::AdminProfiles, Action::Update)?;
    payload.validate()?;

    app_state
        .user_repo
        .find_admin_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Admin profile"))?;

    let profile = app_state.user_repo.update_admin_profile(id, &payload).await?;
    let owner = profile.user_id;

    Ok((StatusCode::OK, Json(with_owner(&app_state, profile, owner).await?)))
}

// DELETE /api/users/admin-profiles/{id}
pub async fn delete_admin_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = authorize(Some(&user), Resource::AdminProfiles, Action::Delete)?;

    app_state
        .user_repo
        .find_admin_profile(id)
        .await?
        .filter(|p| access.permits(&user, p.user_id))
        .ok_or(AppError::NotFound("Admin profile"))?;

    if !app_state.user_repo.delete_admin_profile(id).await? {
        return Err(AppError::NotFound("Admin profile"));
    }

    Ok(StatusCode::NO_CONTENT)
}
