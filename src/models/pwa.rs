// src/models/pwa.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_priority;

// =============================================================================
//  PUSH SUBSCRIPTIONS
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PushSubscription {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PushSubscriptionPayload {
    #[validate(url(message = "The endpoint must be a valid URL."), length(max = 500))]
    pub endpoint: String,

    #[validate(length(min = 1, max = 255, message = "The p256dh key is required."))]
    pub p256dh: String,

    #[validate(length(min = 1, max = 255, message = "The auth secret is required."))]
    pub auth: String,
}

/// What the service worker receives; empty optionals are not sent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Notification {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,

    #[serde(alias = "message")]
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationPayload {
    pub user_id: Uuid,

    #[serde(flatten)]
    #[validate(nested)]
    pub notification: Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    VapidNotConfigured,
    NoSubscriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Error,
}

/// Outcome for one subscription of a push batch.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub subscription_id: Uuid,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The provider reported the endpoint gone and the subscription was deleted.
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    Skipped { reason: SkipReason },
    Sent { results: Vec<DeliveryReport> },
}

// =============================================================================
//  OFFLINE ACTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "create",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown action type '{0}'")]
pub struct UnknownActionType(String);

impl TryFrom<String> for ActionType {
    type Error = UnknownActionType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "create" => Ok(ActionType::Create),
            "update" => Ok(ActionType::Update),
            "delete" => Ok(ActionType::Delete),
            _ => Err(UnknownActionType(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OfflineAction {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub action_type: ActionType,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OfflineActionPayload {
    pub action_type: ActionType,

    #[validate(length(min = 1, max = 50, message = "The resource type is required (max 50 characters)."))]
    pub resource_type: String,

    #[validate(length(max = 50, message = "The resource id must be at most 50 characters."))]
    pub resource_id: Option<String>,

    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action_id: Uuid,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub status: &'static str,
    pub processed_count: usize,
    pub synced_count: usize,
    pub results: Vec<ActionReport>,
}

// =============================================================================
//  SEO
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SeoMetadata {
    pub id: Uuid,
    pub page_type: String,
    pub page_identifier: Option<String>,
    pub title: String,
    pub description: String,
    pub keywords: Option<String>,
    pub canonical_url: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub structured_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeoQuery {
    pub page_type: Option<String>,
    pub page_identifier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown change frequency '{0}'")]
pub struct UnknownChangeFreq(String);

impl TryFrom<String> for ChangeFreq {
    type Error = UnknownChangeFreq;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::String(value.clone())).map_err(|_| UnknownChangeFreq(value))
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SitemapEntry {
    pub id: Uuid,
    pub url: String,
    pub priority: Decimal,
    #[sqlx(try_from = "String")]
    pub changefreq: ChangeFreq,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SitemapEntryPayload {
    #[validate(url(message = "The URL must be absolute."), length(max = 500))]
    pub url: String,

    #[serde(default = "default_priority")]
    #[validate(custom(function = "validate_priority"))]
    pub priority: Decimal,

    #[serde(default = "default_changefreq")]
    pub changefreq: ChangeFreq,
}

fn default_priority() -> Decimal {
    Decimal::new(5, 1)
}

fn default_changefreq() -> ChangeFreq {
    ChangeFreq::Monthly
}

// =============================================================================
//  PWA DOCUMENTS
// =============================================================================

/// Which client application a PWA document is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
    Customer,
    Vendor,
    Admin,
}

impl AppType {
    /// Unknown or missing app types fall back to the customer app.
    pub fn from_path(segment: Option<&str>) -> Self {
        match segment {
            Some("vendor") => AppType::Vendor,
            Some("admin") => AppType::Admin,
            _ => AppType::Customer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Customer => "customer",
            AppType::Vendor => "vendor",
            AppType::Admin => "admin",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppType::Customer => "Customer",
            AppType::Vendor => "Vendor",
            AppType::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub orientation: String,
    pub icons: Vec<ManifestIcon>,
    pub scope: String,
    pub dir: String,
    pub lang: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceWorkerConfig {
    pub cache_name: String,
    pub urls_to_cache: Vec<String>,
    pub offline_page: String,
    pub cache_version: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebPushConfig {
    pub public_key: String,
}
