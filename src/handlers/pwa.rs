// src/handlers/pwa.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        policy::{authorize, Action, Resource},
    },
    models::pwa::{OfflineActionPayload, PushSubscriptionPayload, SendNotificationPayload},
};

// ---
// Push subscriptions (always scoped to the caller)
// ---

// GET /api/push-subscriptions
pub async fn list_push_subscriptions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::PushSubscriptions, Action::Read)?;

    let subscriptions = app_state.push_repo.list_for_user(user.id).await?;

    Ok((StatusCode::OK, Json(subscriptions)))
}

// POST /api/push-subscriptions
pub async fn create_push_subscription(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PushSubscriptionPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::PushSubscriptions, Action::Create)?;
    payload.validate()?;

    // Re-subscribing the same endpoint refreshes its keys
    let subscription = app_state.push_repo.upsert(user.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

// GET /api/push-subscriptions/{id}
pub async fn get_push_subscription(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::PushSubscriptions, Action::Read)?;

    let subscription = app_state
        .push_repo
        .find_for_user(user.id, id)
        .await?
        .ok_or(AppError::NotFound("Push subscription"))?;

    Ok((StatusCode::OK, Json(subscription)))
}

// DELETE /api/push-subscriptions/{id}
pub async fn delete_push_subscription(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::PushSubscriptions, Action::Delete)?;

    if !app_state.push_repo.delete_for_user(user.id, id).await? {
        return Err(AppError::NotFound("Push subscription"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/notifications/send
pub async fn send_notification(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SendNotificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Notifications, Action::Create)?;
    payload.validate()?;

    let outcome = app_state
        .push_service
        .send_push(payload.user_id, &payload.notification)
        .await?;

    Ok((StatusCode::OK, Json(outcome)))
}

// ---
// Offline actions
// ---

// GET /api/offline-actions
pub async fn list_offline_actions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::OfflineActions, Action::Read)?;

    let actions = app_state.offline_repo.list_for_user(user.id).await?;

    Ok((StatusCode::OK, Json(actions)))
}

// POST /api/offline-actions
pub async fn create_offline_action(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<OfflineActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::OfflineActions, Action::Create)?;
    payload.validate()?;

    let action = app_state.offline_repo.create(user.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(action)))
}

// GET /api/offline-actions/{id}
pub async fn get_offline_action(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::OfflineActions, Action::Read)?;

    let action = app_state
        .offline_repo
        .find_for_user(user.id, id)
        .await?
        .ok_or(AppError::NotFound("Offline action"))?;

    Ok((StatusCode::OK, Json(action)))
}

// DELETE /api/offline-actions/{id}
pub async fn delete_offline_action(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::OfflineActions, Action::Delete)?;

    if !app_state.offline_repo.delete_for_user(user.id, id).await? {
        return Err(AppError::NotFound("Offline action"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/offline-actions/sync
pub async fn sync_offline_actions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::OfflineActions, Action::Sync)?;

    let report = app_state.offline_sync.sync_pending(user.id).await?;

    Ok((StatusCode::OK, Json(report)))
}
