/*!
 * # Authentication and Authorization
 *
 * JWT access/refresh tokens with argon2 password hashes. Authorization never
 * trusts the role embedded in a token: the middleware re-resolves the user
 * row on every request and uses the stored role and `is_active` flag, so a
 * role change or deactivation takes effect immediately.
 *
 * Revocation lives in the `revoked_tokens` table (keyed by JWT id with the
 * token's own expiry) so every instance of the service shares it; a periodic
 * sweep deletes expired rows.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        revoked_token::{self, Entity as RevokedTokenEntity},
        user::{self, Entity as UserEntity},
    },
    errors::ServiceError,
};

pub mod rbac;

pub use rbac::*;

const TOKEN_USE_ACCESS: &str = "access";
const TOKEN_USE_REFRESH: &str = "refresh";

/// JWT claim set for both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// Role at issuance time. Display-only; authorization re-reads the user row.
    pub role: String,
    /// Unique token id, the revocation key.
    pub jti: String,
    /// `access` or `refresh`.
    pub token_use: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authenticated identity attached to a request by the auth middleware.
/// `role` and the active check come from the current user record, not the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&user::Model> for CurrentUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Not authenticated".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

/// Token issuance, verification and password hashing.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    pub fn hash_password(password: &str) -> Result<String, ServiceError> {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
        let salt = SaltString::generate(&mut OsRng);
        argon2::Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {e}")))
    }

    pub fn verify_password(password: &str, hash: &str) -> bool {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};
        PasswordHash::new(hash)
            .map(|parsed| {
                argon2::Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Verifies credentials and issues a token pair. Inactive users are
    /// rejected with the same message as bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(TokenPair, user::Model), ServiceError> {
        let user = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        if !user.is_active || !Self::verify_password(password, &user.password_hash) {
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let tokens = self.issue_tokens(&user)?;
        debug!(user_id = %user.id, "User logged in");
        Ok((tokens, user))
    }

    pub fn issue_tokens(&self, user: &user::Model) -> Result<TokenPair, ServiceError> {
        let access = self.sign(user, TOKEN_USE_ACCESS, self.config.access_token_ttl_secs)?;
        let refresh = self.sign(user, TOKEN_USE_REFRESH, self.config.refresh_token_ttl_secs)?;
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    fn sign(&self, user: &user::Model, token_use: &str, ttl_secs: i64) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            token_use: token_use.to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::seconds(ttl_secs)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token signing failed: {e}")))
    }

    fn decode_claims(&self, token: &str, validate_exp: bool) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.validate_exp = validate_exp;
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        })
    }

    /// Resolves a bearer token to the current user: signature and expiry,
    /// revocation store, then a fresh user-row load with `is_active` check.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, ServiceError> {
        let claims = self.decode_claims(token, true)?;
        if claims.token_use != TOKEN_USE_ACCESS {
            return Err(ServiceError::Unauthorized("Invalid token".to_string()));
        }
        if self.is_revoked(&claims.jti).await? {
            return Err(ServiceError::Unauthorized(
                "Token has been invalidated".to_string(),
            ));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token".to_string()))?;
        let user = UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::Unauthorized("User not found or inactive".to_string())
            })?;
        if !user.is_active {
            return Err(ServiceError::Unauthorized(
                "User not found or inactive".to_string(),
            ));
        }
        Ok(CurrentUser::from(&user))
    }

    /// Exchanges a refresh token for a new token pair.
    #[instrument(skip(self, token))]
    pub async fn refresh(&self, token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.decode_claims(token, true)?;
        if claims.token_use != TOKEN_USE_REFRESH {
            return Err(ServiceError::Unauthorized("Invalid refresh token".to_string()));
        }
        if self.is_revoked(&claims.jti).await? {
            return Err(ServiceError::Unauthorized(
                "Token has been invalidated".to_string(),
            ));
        }
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid refresh token".to_string()))?;
        let user = UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                ServiceError::Unauthorized("User not found or inactive".to_string())
            })?;
        self.issue_tokens(&user)
    }

    /// Revokes a token by recording its id until the token would expire
    /// anyway. Accepts already-expired tokens so logout never fails.
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str) -> Result<(), ServiceError> {
        let claims = self.decode_claims(token, false)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let model = revoked_token::ActiveModel {
            jti: Set(claims.jti),
            expires_at: Set(expires_at),
        };
        // A second logout with the same token is a no-op.
        if let Err(e) = RevokedTokenEntity::insert(model).exec(&*self.db).await {
            debug!("Revocation insert skipped: {e}");
        }
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, ServiceError> {
        Ok(RevokedTokenEntity::find_by_id(jti.to_string())
            .one(&*self.db)
            .await?
            .is_some())
    }
}

/// Deletes revocation records whose tokens have expired on their own.
/// Scheduled from `main` rather than tied to any request.
pub async fn sweep_revoked_tokens(db: &DatabaseConnection) {
    let result = RevokedTokenEntity::delete_many()
        .filter(revoked_token::Column::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await;
    match result {
        Ok(res) if res.rows_affected > 0 => {
            debug!(rows = res.rows_affected, "Swept expired token revocations")
        }
        Ok(_) => {}
        Err(e) => warn!("Revocation sweep failed: {e}"),
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Layer applied to every `/api` route: resolves the bearer token and
/// attaches the [`CurrentUser`] to the request.
pub async fn require_auth(
    State(state): State<crate::AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or_else(|| ServiceError::Unauthorized("No token provided".to_string()))?;
    let user = state.auth.authenticate(&token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = AuthService::hash_password("hunter2!").unwrap();
        assert!(AuthService::verify_password("hunter2!", &hash));
        assert!(!AuthService::verify_password("hunter3!", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!AuthService::verify_password("pw", "not-a-phc-string"));
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
