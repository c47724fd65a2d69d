// src/handlers/catalog.rs
//
// Catalog reads are public; every write is admin-only.

use axum::{
    extract::{Path, Query, State},
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
        auth::{AuthenticatedUser, MaybeUser},
        policy::{authorize, Action, Resource},
    },
    models::catalog::{
        CatalogQuery, CategoryPayload, PaymentTermPayload, ServicePayload, TaxPayload, UpdateCategoryPayload,
        UpdatePaymentTermPayload, UpdateServicePayload, UpdateTaxPayload,
    },
};

// ---
// Categories
// ---

// GET /api/core/categories
pub async fn list_categories(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let categories = app_state.catalog_repo.list_categories(&query).await?;

    Ok((StatusCode::OK, Json(categories)))
}

// GET /api/core/categories/{id}
pub async fn get_category(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let category = app_state
        .catalog_repo
        .find_category(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    Ok((StatusCode::OK, Json(category)))
}

// POST /api/core/categories
pub async fn create_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Create)?;
    payload.validate()?;

    let category = app_state.catalog_repo.create_category(&payload).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// PATCH /api/core/categories/{id}
pub async fn update_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Update)?;
    payload.validate()?;

    let category = app_state.catalog_repo.update_category(id, &payload).await?;

    Ok((StatusCode::OK, Json(category)))
}

// DELETE /api/core/categories/{id}
pub async fn delete_category(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Delete)?;

    if !app_state.catalog_repo.delete_category(id).await? {
        return Err(AppError::NotFound("Category"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Services
// ---

// GET /api/core/services
pub async fn list_services(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let services = app_state.catalog_repo.list_services(&query).await?;

    Ok((StatusCode::OK, Json(services)))
}

// GET /api/core/services/{id}
pub async fn get_service(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let service = app_state
        .catalog_repo
        .find_service(id)
        .await?
        .ok_or(AppError::NotFound("Service"))?;

    Ok((StatusCode::OK, Json(service)))
}

// POST /api/core/services
pub async fn create_service(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Create)?;
    payload.validate()?;

    let service = app_state.catalog_repo.create_service(&payload).await?;

    Ok((StatusCode::CREATED, Json(service)))
}

// PATCH /api/core/services/{id}
pub async fn update_service(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Update)?;
    payload.validate()?;

    let service = app_state.catalog_repo.update_service(id, &payload).await?;

    Ok((StatusCode::OK, Json(service)))
}

// DELETE /api/core/services/{id}
pub async fn delete_service(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Delete)?;

    if !app_state.catalog_repo.delete_service(id).await? {
        return Err(AppError::NotFound("Service"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Taxes
// ---

// GET /api/core/taxes
pub async fn list_taxes(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let taxes = app_state.catalog_repo.list_taxes(&query).await?;

    Ok((StatusCode::OK, Json(taxes)))
}

// GET /api/core/taxes/{id}
pub async fn get_tax(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let tax = app_state.catalog_repo.find_tax(id).await?.ok_or(AppError::NotFound("Tax"))?;

    Ok((StatusCode::OK, Json(tax)))
}

// POST /api/core/taxes
pub async fn create_tax(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<TaxPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Create)?;
    payload.validate()?;

    let tax = app_state.catalog_repo.create_tax(&payload).await?;

    Ok((StatusCode::CREATED, Json(tax)))
}

// PATCH /api/core/taxes/{id}
pub async fn update_tax(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaxPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Update)?;
    payload.validate()?;

    let tax = app_state.catalog_repo.update_tax(id, &payload).await?;

    Ok((StatusCode::OK, Json(tax)))
}

// DELETE /api/core/taxes/{id}
pub async fn delete_tax(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Delete)?;

    if !app_state.catalog_repo.delete_tax(id).await? {
        return Err(AppError::NotFound("Tax"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Payment terms
// ---

// GET /api/core/payment-terms
pub async fn list_payment_terms(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let terms = app_state.catalog_repo.list_payment_terms(&query).await?;

    Ok((StatusCode::OK, Json(terms)))
}

// GET /api/core/payment-terms/{id}
pub async fn get_payment_term(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::Catalog, Action::Read)?;

    let term = app_state
        .catalog_repo
        .find_payment_term(id)
        .await?
        .ok_or(AppError::NotFound("Payment term"))?;

    Ok((StatusCode::OK, Json(term)))
}

// POST /api/core/payment-terms
pub async fn create_payment_term(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PaymentTermPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Create)?;
    payload.validate()?;

    let term = app_state.catalog_repo.create_payment_term(&payload).await?;

    Ok((StatusCode::CREATED, Json(term)))
}

// PATCH /api/core/payment-terms/{id}
pub async fn update_payment_term(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentTermPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Update)?;
    payload.validate()?;

    let term = app_state.catalog_repo.update_payment_term(id, &payload).await?;

    Ok((StatusCode::OK, Json(term)))
}

// DELETE /api/core/payment-terms/{id}
pub async fn delete_payment_term(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::Catalog, Action::Delete)?;

    if !app_state.catalog_repo.delete_payment_term(id).await? {
        return Err(AppError::NotFound("Payment term"));
    }

    Ok(StatusCode::NO_CONTENT)
}
