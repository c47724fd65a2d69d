// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::common::validation::{blank_to_none, require_identity, validate_mobile};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Vendor,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Vendor => "vendor",
            UserType::Admin => "admin",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown user type '{0}'")]
pub struct UnknownUserType(String);

impl TryFrom<String> for UserType {
    type Error = UnknownUserType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "customer" => Ok(UserType::Customer),
            "vendor" => Ok(UserType::Vendor),
            "admin" => Ok(UserType::Admin),
            _ => Err(UnknownUserType(value)),
        }
    }
}

// --- USER ---

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,

    #[sqlx(try_from = "String")]
    pub user_type: UserType,

    pub is_active: bool,
    #[serde(skip_serializing)]
    pub is_staff: bool,
    #[serde(skip_serializing)]
    pub is_superuser: bool,

    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub date_joined: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

// --- PROFILES ---

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerProfile {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VendorProfile {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub business_name: String,
    pub business_address: String,
    pub service_areas: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminProfile {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A profile as returned by the API, with its owner embedded.
#[derive(Debug, Serialize)]
pub struct ProfileResponse<P: Serialize> {
    #[serde(flatten)]
    pub profile: P,
    pub user: User,
}

// --- REGISTRATION PAYLOADS ---

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCustomerPayload {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: Option<String>,

    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "The email must be at most 254 characters."))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "First name must be at most 30 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 30, message = "Last name must be at most 30 characters."))]
    pub last_name: Option<String>,

    pub address: Option<String>,
}

impl RegisterCustomerPayload {
    /// Trims blanks away, then runs field and cross-field rules.
    pub fn normalized(self) -> Result<Self, ValidationErrors> {
        let payload = Self {
            mobile: blank_to_none(self.mobile),
            email: blank_to_none(self.email),
            first_name: blank_to_none(self.first_name),
            last_name: blank_to_none(self.last_name),
            address: blank_to_none(self.address),
        };
        payload.validate()?;
        require_identity(payload.mobile.as_deref(), payload.email.as_deref())?;
        Ok(payload)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterVendorPayload {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: Option<String>,

    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "The email must be at most 254 characters."))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 30, message = "First name is required (max 30 characters)."))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name is required (max 30 characters)."))]
    pub last_name: String,

    #[validate(length(min = 1, max = 100, message = "Business name is required (max 100 characters)."))]
    pub business_name: String,

    #[validate(length(min = 1, message = "Business address is required."))]
    pub business_address: String,

    pub service_areas: Option<String>,
}

impl RegisterVendorPayload {
    pub fn normalized(self) -> Result<Self, ValidationErrors> {
        let payload = Self {
            mobile: blank_to_none(self.mobile),
            email: blank_to_none(self.email),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            business_name: self.business_name.trim().to_string(),
            business_address: self.business_address.trim().to_string(),
            service_areas: blank_to_none(self.service_areas),
        };
        payload.validate()?;
        require_identity(payload.mobile.as_deref(), payload.email.as_deref())?;
        Ok(payload)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAdminPayload {
    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "The email must be at most 254 characters."))]
    pub email: String,

    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub password: String,

    #[validate(length(min = 1, max = 30, message = "First name is required (max 30 characters)."))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name is required (max 30 characters)."))]
    pub last_name: String,

    #[validate(length(max = 50, message = "Department must be at most 50 characters."))]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub email: Option<String>,
}

// --- UPDATE PAYLOADS ---

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: Option<String>,

    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "The email must be at most 254 characters."))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "First name must be at most 30 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 30, message = "Last name must be at most 30 characters."))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerProfilePayload {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVendorProfilePayload {
    #[validate(length(min = 1, max = 100, message = "Business name must have 1 to 100 characters."))]
    pub business_name: Option<String>,

    #[validate(length(min = 1, message = "Business address cannot be empty."))]
    pub business_address: Option<String>,

    pub service_areas: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminProfilePayload {
    #[validate(length(max = 50, message = "Department must be at most 50 characters."))]
    pub department: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(mobile: Option<&str>, business_name: &str) -> RegisterVendorPayload {
        RegisterVendorPayload {
            mobile: mobile.map(str::to_string),
            email: None,
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            business_name: business_name.into(),
            business_address: "12 MG Road".into(),
            service_areas: Some("".into()),
        }
    }

    #[test]
    fn vendor_payload_accepts_the_reference_registration() {
        let payload = vendor(Some("9876543210"), "Acme Cleaners").normalized().unwrap();
        assert_eq!(payload.business_name, "Acme Cleaners");
        assert_eq!(payload.service_areas, None);
    }

    #[test]
    fn vendor_payload_requires_business_name() {
        let errors = vendor(Some("9876543210"), "   ").normalized().unwrap_err();
        assert!(errors.field_errors().contains_key("business_name"));
    }

    #[test]
    fn vendor_payload_requires_an_identity() {
        let errors = vendor(None, "Acme Cleaners").normalized().unwrap_err();
        assert!(errors.field_errors().contains_key("mobile"));
    }

    #[test]
    fn customer_payload_treats_blank_email_as_absent() {
        let payload = RegisterCustomerPayload {
            mobile: Some("9876543210".into()),
            email: Some("".into()),
            first_name: None,
            last_name: None,
            address: None,
        }
        .normalized()
        .unwrap();
        assert_eq!(payload.email, None);
    }

    #[test]
    fn customer_payload_rejects_malformed_mobile() {
        let errors = RegisterCustomerPayload {
            mobile: Some("12ab".into()),
            email: None,
            first_name: None,
            last_name: None,
            address: None,
        }
        .normalized()
        .unwrap_err();
        assert!(errors.field_errors().contains_key("mobile"));
    }

    #[test]
    fn email_longer_than_its_column_is_rejected() {
        // Well-formed, but longer than the column
        let long = format!("{}@{}com", "a".repeat(64), format!("{}.", "b".repeat(60)).repeat(4));
        assert!(long.len() > 254);
        let errors = RegisterCustomerPayload {
            mobile: None,
            email: Some(long),
            first_name: None,
            last_name: None,
            address: None,
        }
        .normalized()
        .unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn privilege_flags_stay_out_of_responses() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            mobile: Some("9876543210".into()),
            email: None,
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            user_type: UserType::Admin,
            is_active: true,
            is_staff: true,
            is_superuser: true,
            password_hash: Some("hash".into()),
            date_joined: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_type"], "admin");
        assert!(json.get("is_staff").is_none());
        assert!(json.get("is_superuser").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn user_type_round_trips_through_its_column_value() {
        for t in [UserType::Customer, UserType::Vendor, UserType::Admin] {
            assert_eq!(UserType::try_from(t.as_str().to_string()).unwrap(), t);
        }
        assert!(UserType::try_from("root".to_string()).is_err());
    }
}
