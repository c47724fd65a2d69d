// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_mobile, validate_otp_code};
use crate::models::user::UserType;

/// A one-time passcode row. At most one exists per mobile number.
#[derive(Debug, Clone, FromRow)]
pub struct OneTimePasscode {
    pub id: Uuid,
    pub mobile: String,
    pub code: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OneTimePasscode {
    /// Unverified and not yet expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_verified && now < self.expires_at
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpPayload {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpPayload {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,

    #[validate(custom(function = "validate_otp_code"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginPayload {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenPayload {
    #[validate(length(min = 1, message = "The refresh token is required."))]
    pub refresh: String,
}

// --- RESPONSES ---

#[derive(Debug, Serialize)]
pub struct OtpSentResponse {
    pub message: &'static str,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OtpVerifiedResponse {
    ExistingUser {
        #[serde(flatten)]
        tokens: TokenPair,
        user_type: UserType,
        is_new_user: bool,
    },
    NewUser {
        message: &'static str,
        mobile: String,
        is_new_user: bool,
    },
}

// --- JWT ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,              // user id
    pub exp: usize,             // expiration
    pub iat: usize,             // issued at
    pub token_type: TokenType,
    pub user_type: UserType,
}
