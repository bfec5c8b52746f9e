//! Password hashing and bearer-token authentication

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Role};
use crate::infrastructure::AppState;
use crate::models::user::Entity as User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> i32 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

/// Signing material for access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn create_token(&self, user_id: i32, email: &str, role: &str) -> Result<String, DomainError> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| DomainError::Internal("Token expiry overflow".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            role: role.to_owned(),
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, DomainError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| DomainError::Unauthorized("Invalid or expired token".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                DomainError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            DomainError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let state = AppState::from_ref(state);
        let mut claims = state.jwt().decode_token(token.trim())?;

        // The account may have been disabled, deleted or re-roled since issue
        let user = User::find_by_id(claims.sub)
            .one(state.db())
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Account no longer exists".to_string()))?;
        if !user.is_active {
            return Err(DomainError::Forbidden("Account is disabled".to_string()));
        }
        claims.email = user.email;
        claims.role = user.role;
        Ok(claims)
    }
}

/// Claims of an authenticated administrator.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminClaims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            tracing::warn!("Non-admin user {} attempted an admin action", claims.sub);
            return Err(DomainError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }
        Ok(AdminClaims(claims))
    }
}

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DomainError::Internal(e.to_string()))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn tokens_carry_identity_and_role() {
        let keys = JwtKeys::new("test-secret", 1);
        let token = keys.create_token(7, "a@b.test", "admin").unwrap();
        let claims = keys.decode_token(&token).unwrap();
        assert_eq!(claims.user_id(), 7);
        assert!(claims.is_admin());
    }

    #[test]
    fn tokens_from_another_key_are_rejected() {
        let token = JwtKeys::new("one", 1)
            .create_token(1, "a@b.test", "customer")
            .unwrap();
        let err = JwtKeys::new("two", 1).decode_token(&token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }
}
