// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{
        AdminLoginPayload, OtpSentResponse, OtpVerifiedResponse, RefreshTokenPayload, SendOtpPayload,
        VerifyOtpPayload,
    },
};

// POST /api/auth/otp/send
pub async fn send_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<SendOtpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state.otp_service.request_otp(&payload.mobile).await?;

    Ok((
        StatusCode::OK,
        Json(OtpSentResponse { message: "OTP sent successfully", mobile: payload.mobile }),
    ))
}

// POST /api/auth/otp/verify
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !app_state.otp_service.verify_otp(&payload.mobile, &payload.otp).await? {
        return Err(AppError::InvalidOtp);
    }

    // A verified mobile either logs an existing user in or starts a registration
    let response = match app_state.user_repo.find_by_mobile(&payload.mobile).await? {
        Some(user) if !user.is_active => return Err(AppError::InactiveAccount),
        Some(user) => OtpVerifiedResponse::ExistingUser {
            tokens: app_state.auth_service.issue_tokens(&user)?,
            user_type: user.user_type,
            is_new_user: false,
        },
        None => OtpVerifiedResponse::NewUser {
            message: "OTP verified successfully",
            mobile: payload.mobile,
            is_new_user: true,
        },
    };

    Ok((StatusCode::OK, Json(response)))
}

// POST /api/auth/admin/login
pub async fn admin_login(
    State(app_state): State<AppState>,
    Json(payload): Json<AdminLoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.admin_login(&payload.email, &payload.password).await?;

    Ok((StatusCode::OK, Json(response)))
}

// POST /api/auth/token/refresh
pub async fn refresh_token(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tokens = app_state.auth_service.refresh(&payload.refresh).await?;

    Ok((StatusCode::OK, Json(tokens)))
}
