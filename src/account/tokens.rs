/// Access / refresh token lifecycle
///
/// Every user has at most one live refresh token, stored on the user row.
/// Issuing a pair overwrites it, so any earlier refresh token stops working
/// immediately even if its `exp` lies in the future. Concurrent rotations
/// for the same user are not serialized: the last writer wins.
use crate::{
    config::AuthConfig,
    error::{ApiError, ApiResult},
    ids::ObjectId,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    /// Unique per issue so two pairs minted in the same second still differ
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Freshly issued credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token service
pub struct TokenService {
    db: SqlitePool,
    config: AuthConfig,
}

impl TokenService {
    /// Create a new token service; secrets come from `config`
    pub fn new(db: SqlitePool, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Issue an access/refresh pair and make the refresh token the user's only live one
    pub async fn issue_token_pair(&self, user_id: &ObjectId) -> ApiResult<TokenPair> {
        let row = sqlx::query("SELECT username, email FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        let username: String = row.try_get("username")?;
        let email: String = row.try_get("email")?;

        let access_token = self.generate_access_token(user_id, &username, &email)?;
        let refresh_token = self.generate_refresh_token(user_id)?;

        sqlx::query("UPDATE users SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&refresh_token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id = %user_id, "Issued session tokens");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a brand new pair
    pub async fn rotate(&self, presented: Option<&str>) -> ApiResult<TokenPair> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

        let claims = self.verify_refresh_token(presented)?;
        let user_id = ObjectId::parse(&claims.sub, "user")
            .map_err(|_| ApiError::InvalidToken("Invalid refresh token".to_string()))?;

        let row = sqlx::query("SELECT refresh_token FROM users WHERE id = ?1")
            .bind(&user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::InvalidToken("Invalid refresh token".to_string()))?;

        let stored: Option<String> = row.try_get("refresh_token")?;
        if stored.as_deref() != Some(presented) {
            tracing::warn!(user_id = %user_id, "Rejected stale or replayed refresh token");
            return Err(ApiError::TokenReuse);
        }

        self.issue_token_pair(&user_id).await
    }

    /// Clear the stored refresh token (logout)
    pub async fn invalidate(&self, user_id: &ObjectId) -> ApiResult<()> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id = %user_id, "Invalidated session");

        Ok(())
    }

    /// Check signature and expiry of an access token
    pub fn verify_access_token(&self, token: &str) -> ApiResult<AccessClaims> {
        let key = DecodingKey::from_secret(self.config.access_token_secret.as_bytes());
        decode::<AccessClaims>(token, &key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        ApiError::Unauthorized("Access token has expired".to_string())
                    }
                    _ => ApiError::Unauthorized("Invalid access token".to_string()),
                }
            })
    }

    fn verify_refresh_token(&self, token: &str) -> ApiResult<RefreshClaims> {
        let key = DecodingKey::from_secret(self.config.refresh_token_secret.as_bytes());
        decode::<RefreshClaims>(token, &key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("Refresh token verification failed: {}", e);
                ApiError::InvalidToken("Invalid refresh token".to_string())
            })
    }

    /// Generate access JWT token
    fn generate_access_token(&self, user_id: &ObjectId, username: &str, email: &str) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            iat: now,
            exp: expires_at(now, self.config.access_token_expiry),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.access_token_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to generate access token: {}", e)))
    }

    /// Generate refresh JWT token
    fn generate_refresh_token(&self, user_id: &ObjectId) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: expires_at(now, self.config.refresh_token_expiry),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.refresh_token_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to generate refresh token: {}", e)))
    }
}

/// `exp` claim for a token issued at `now`, saturating instead of wrapping
fn expires_at(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}
