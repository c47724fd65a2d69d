// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{Claims, LoginResponse, TokenPair, TokenType},
        user::{User, UserType},
    },
};

/// Signs and checks HS256 token pairs. Holds no database handle.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            refresh: self.issue(user, TokenType::Refresh)?,
            access: self.issue(user, TokenType::Access)?,
        })
    }

    pub fn issue(&self, user: &User, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user.id,
            exp: (now + ttl).timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
            token_type,
            user_type: user.user_type,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Any failure (signature, expiry, wrong token type) is `InvalidToken`.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?
            .claims;

        if claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, tokens: TokenIssuer) -> Self {
        Self { user_repo, tokens }
    }

    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        self.tokens.issue_pair(user)
    }

    /// Email + password login, reserved for active admin accounts.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .filter(|u| u.user_type == UserType::Admin && u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, password_hash).await? {
            tracing::warn!(user_id = %user.id, "admin login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "admin logged in");
        Ok(LoginResponse {
            tokens: self.tokens.issue_pair(&user)?,
            user_type: user.user_type,
        })
    }

    /// New access token for a valid refresh token; the refresh token itself is returned unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.tokens.decode(refresh_token, TokenType::Refresh)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)?;

        Ok(TokenPair {
            refresh: refresh_token.to_string(),
            access: self.tokens.issue(&user, TokenType::Access)?,
        })
    }

    /// Resolves a Bearer access token to its (active) user.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.decode(token, TokenType::Access)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::InactiveAccount);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(user_type: UserType) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            mobile: Some("9876543210".into()),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            user_type,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            password_hash: None,
            date_joined: now,
            updated_at: now,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::minutes(60), Duration::days(7))
    }

    #[test]
    fn access_token_carries_subject_and_user_type() {
        let vendor = user(UserType::Vendor);
        let pair = issuer().issue_pair(&vendor).unwrap();

        let claims = issuer().decode(&pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.sub, vendor.id);
        assert_eq!(claims.user_type, UserType::Vendor);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let pair = issuer().issue_pair(&user(UserType::Customer)).unwrap();

        assert!(matches!(issuer().decode(&pair.refresh, TokenType::Access), Err(AppError::InvalidToken)));
        assert!(matches!(issuer().decode(&pair.access, TokenType::Refresh), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let expired = TokenIssuer::new("test-secret", Duration::minutes(-10), Duration::days(7))
            .issue(&user(UserType::Customer), TokenType::Access)
            .unwrap();
        assert!(matches!(issuer().decode(&expired, TokenType::Access), Err(AppError::InvalidToken)));

        let foreign = TokenIssuer::new("other-secret", Duration::minutes(60), Duration::days(7))
            .issue(&user(UserType::Customer), TokenType::Access)
            .unwrap();
        assert!(matches!(issuer().decode(&foreign, TokenType::Access), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies_only_the_original() {
        let hashed = hash_password("s3cret-pass").await.unwrap();
        assert!(verify_password("s3cret-pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong-pass", &hashed).await.unwrap());
    }
}
