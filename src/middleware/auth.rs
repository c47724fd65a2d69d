// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::user::User};

/// Resolves a Bearer access token, when one is sent, into the request's `User`.
///
/// Requests without an Authorization header pass through anonymously; a header
/// that is present but not a valid access token is rejected with 401.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.headers().contains_key(AUTHORIZATION) {
        let bearer = request
            .headers()
            .typed_get::<Authorization<Bearer>>()
            .ok_or(AppError::InvalidToken)?;

        let user = app_state.auth_service.validate_token(bearer.token()).await?;
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

/// The caller, required.
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::NotAuthenticated)
    }
}

/// The caller, if any.
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<User>().cloned()))
    }
}
