// src/handlers/seo.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, MaybeUser},
        policy::{authorize, Action, Resource},
    },
    models::pwa::{AppType, SeoQuery, SitemapEntryPayload, WebPushConfig},
    services::seo,
};

// ---
// PWA documents
// ---

// GET /manifest.json
pub async fn manifest(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(seo::manifest(AppType::Customer, &app_state.settings.pwa))
}

// GET /{app_type}/manifest.json
pub async fn app_manifest(State(app_state): State<AppState>, Path(app_type): Path<String>) -> impl IntoResponse {
    Json(seo::manifest(AppType::from_path(Some(&app_type)), &app_state.settings.pwa))
}

// GET /sw-config.json
pub async fn sw_config() -> impl IntoResponse {
    Json(seo::service_worker_config(AppType::Customer))
}

// GET /{app_type}/sw-config.json
pub async fn app_sw_config(Path(app_type): Path<String>) -> impl IntoResponse {
    Json(seo::service_worker_config(AppType::from_path(Some(&app_type))))
}

// GET /robots.txt
pub async fn robots(State(app_state): State<AppState>) -> impl IntoResponse {
    robots_response(&app_state, AppType::Customer)
}

// GET /{app_type}/robots.txt
pub async fn app_robots(State(app_state): State<AppState>, Path(app_type): Path<String>) -> impl IntoResponse {
    robots_response(&app_state, AppType::from_path(Some(&app_type)))
}

fn robots_response(app_state: &AppState, app: AppType) -> Response {
    let body = seo::robots_txt(app, &app_state.settings.site_url, Utc::now().date_naive());
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

// GET /webpush-config.json
pub async fn webpush_config(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(WebPushConfig { public_key: app_state.settings.vapid_public_key.clone() })
}

// GET /sitemap.xml
pub async fn sitemap(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.seo_repo.list_sitemap_entries().await?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], seo::sitemap_xml(&entries)?))
}

// ---
// SEO metadata (public read)
// ---

// GET /api/seo-metadata
pub async fn list_seo_metadata(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<SeoQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::SeoMetadata, Action::Read)?;

    let rows = app_state.seo_repo.list_metadata(&query).await?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/seo-metadata/{id}
pub async fn get_seo_metadata(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(user.as_ref(), Resource::SeoMetadata, Action::Read)?;

    let row = app_state
        .seo_repo
        .find_metadata(id)
        .await?
        .ok_or(AppError::NotFound("SEO metadata"))?;

    Ok((StatusCode::OK, Json(row)))
}

// ---
// Sitemap entries (admin)
// ---

// GET /api/sitemap-entries
pub async fn list_sitemap_entries(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Read)?;

    let entries = app_state.seo_repo.list_sitemap_entries().await?;

    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/sitemap-entries/{id}
pub async fn get_sitemap_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Read)?;

    let entry = app_state
        .seo_repo
        .find_sitemap_entry(id)
        .await?
        .ok_or(AppError::NotFound("Sitemap entry"))?;

    Ok((StatusCode::OK, Json(entry)))
}

// POST /api/sitemap-entries
pub async fn create_sitemap_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SitemapEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Create)?;
    payload.validate()?;

    let entry = app_state.seo_repo.create_sitemap_entry(&payload).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// PUT /api/sitemap-entries/{id}
pub async fn update_sitemap_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SitemapEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Update)?;
    payload.validate()?;

    let entry = app_state.seo_repo.update_sitemap_entry(id, &payload).await?;

    Ok((StatusCode::OK, Json(entry)))
}

// DELETE /api/sitemap-entries/{id}
pub async fn delete_sitemap_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Delete)?;

    if !app_state.seo_repo.delete_sitemap_entry(id).await? {
        return Err(AppError::NotFound("Sitemap entry"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/sitemap-entries/regenerate
pub async fn regenerate_sitemap(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(Some(&user), Resource::SitemapEntries, Action::Create)?;

    let defaults = seo::default_sitemap(&app_state.settings.site_url);
    let entries = app_state.seo_repo.replace_sitemap_entries(&defaults).await?;

    tracing::info!(count = entries.len(), by = %user.id, "sitemap regenerated");
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Sitemap regenerated with {} entries", entries.len()),
            "entries": entries,
        })),
    ))
}

// ---
// Health
// ---

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(rename = "_")]
    pub timestamp: Option<String>,
}

// GET /api/health-check
pub async fn health_check(Query(query): Query<HealthQuery>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "timestamp": query.timestamp }))
}
