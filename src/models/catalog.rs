// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_price, validate_tax_rate};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    #[serde(rename = "category")]
    pub category_id: Uuid,
    pub category_name: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tax {
    pub id: Uuid,
    pub name: String,
    pub rate: Decimal, // percentage
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentTerm {
    pub id: Uuid,
    pub name: String,
    pub days: i32,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// List filters shared by every catalog resource
// ---
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub is_active: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub category_id: Option<Uuid>,
}

impl CatalogQuery {
    /// `?is_active=true` (any case) filters active rows; any other value filters inactive ones.
    pub fn active_filter(&self) -> Option<bool> {
        self.is_active.as_deref().map(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
    }

    /// Resolves `ordering` against a whitelist of (query name, SQL column).
    pub fn order_by(&self, allowed: &[(&str, &'static str)], default: &'static str) -> String {
        let Some(raw) = self.ordering.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return default.to_string();
        };

        let (field, direction) = match raw.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (raw, "ASC"),
        };

        allowed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| format!("{column} {direction}"))
            .unwrap_or_else(|| default.to_string())
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "The name is required (max 100 characters)."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, max = 100, message = "The name must have 1 to 100 characters."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServicePayload {
    #[serde(alias = "category")]
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "The name is required (max 100 characters)."))]
    pub name: String,

    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,

    #[serde(default = "default_duration")]
    #[validate(range(min = 0, message = "The duration cannot be negative."))]
    pub duration_minutes: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServicePayload {
    #[serde(alias = "category")]
    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "The name must have 1 to 100 characters."))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,

    #[validate(range(min = 0, message = "The duration cannot be negative."))]
    pub duration_minutes: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaxPayload {
    #[validate(length(min = 1, max = 50, message = "The name is required (max 50 characters)."))]
    pub name: String,

    #[validate(custom(function = "validate_tax_rate"))]
    pub rate: Decimal,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaxPayload {
    #[validate(length(min = 1, max = 50, message = "The name must have 1 to 50 characters."))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_tax_rate"))]
    pub rate: Option<Decimal>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentTermPayload {
    #[validate(length(min = 1, max = 50, message = "The name is required (max 50 characters)."))]
    pub name: String,

    #[validate(range(min = 0, message = "Days cannot be negative."))]
    pub days: i32,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentTermPayload {
    #[validate(length(min = 1, max = 50, message = "The name must have 1 to 50 characters."))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Days cannot be negative."))]
    pub days: Option<i32>,

    pub description: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn default_duration() -> i32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[("name", "s.name"), ("price", "s.price")];

    fn query(ordering: Option<&str>) -> CatalogQuery {
        CatalogQuery { ordering: ordering.map(str::to_string), ..Default::default() }
    }

    #[test]
    fn ordering_uses_whitelisted_columns_only() {
        assert_eq!(query(Some("price")).order_by(ALLOWED, "s.created_at DESC"), "s.price ASC");
        assert_eq!(query(Some("-name")).order_by(ALLOWED, "s.created_at DESC"), "s.name DESC");
        assert_eq!(
            query(Some("name; DROP TABLE services")).order_by(ALLOWED, "s.created_at DESC"),
            "s.created_at DESC"
        );
        assert_eq!(query(None).order_by(ALLOWED, "s.created_at DESC"), "s.created_at DESC");
    }

    #[test]
    fn tax_rate_beyond_the_column_is_a_validation_error() {
        let payload: TaxPayload = serde_json::from_value(serde_json::json!({ "name": "GST", "rate": 1000 })).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rate"));

        let payload: TaxPayload = serde_json::from_value(serde_json::json!({ "name": "GST", "rate": 18 })).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn active_filter_is_case_insensitive() {
        let q = CatalogQuery { is_active: Some("True".into()), ..Default::default() };
        assert_eq!(q.active_filter(), Some(true));
        let q = CatalogQuery { is_active: Some("no".into()), ..Default::default() };
        assert_eq!(q.active_filter(), Some(false));
        assert_eq!(CatalogQuery::default().active_filter(), None);
    }

    #[test]
    fn search_pattern_escapes_like_wildcards() {
        let q = CatalogQuery { search: Some(" 50%_off ".into()), ..Default::default() };
        assert_eq!(q.search_pattern().as_deref(), Some("%50\\%\\_off%"));
        let q = CatalogQuery { search: Some("   ".into()), ..Default::default() };
        assert_eq!(q.search_pattern(), None);
    }
}
