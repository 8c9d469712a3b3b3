/// Account manager: the identity store
///
/// Runtime sqlx queries over the `users` and `watch_history` tables.
use crate::{
    account::{
        password::{hash_password, verify_password},
        LoginRequest, PublicUser, RegisterRequest, TokenPair, TokenService,
    },
    db::models::UserRecord,
    error::{ApiError, ApiResult},
    ids::ObjectId,
    media::MediaStore,
    validation::{optional_text, require_email},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

const PUBLIC_USER_COLUMNS: &str =
    "id, username, email, full_name, avatar, cover_image, created_at, updated_at";

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    tokens: Arc<TokenService>,
    media: Arc<dyn MediaStore>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, tokens: Arc<TokenService>, media: Arc<dyn MediaStore>) -> Self {
        Self { db, tokens, media }
    }

    /// Register a new account. The avatar is required, the cover image is not.
    pub async fn register(
        &self,
        request: RegisterRequest,
        avatar: Option<&Path>,
        cover_image: Option<&Path>,
    ) -> ApiResult<PublicUser> {
        let fields = [
            &request.username,
            &request.email,
            &request.full_name,
            &request.password,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ApiError::InvalidInput("All fields are required".to_string()));
        }

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();
        require_email(&email)?;

        if self.username_exists(&username).await? {
            return Err(ApiError::InvalidInput(
                "User with username already exist".to_string(),
            ));
        }

        if self.email_exists(&email, None).await? {
            return Err(ApiError::InvalidInput(
                "User with email already exist".to_string(),
            ));
        }

        let avatar = avatar.ok_or_else(|| ApiError::InvalidInput("Avatar file is required".to_string()))?;
        let avatar = self.media.upload(avatar).await?;
        let cover_image = match cover_image {
            Some(path) => match self.media.upload(path).await {
                Ok(uploaded) => Some(uploaded),
                Err(e) => {
                    self.discard_media(&avatar.url).await;
                    return Err(e);
                }
            },
            None => None,
        };
        let cover_url = cover_image.map(|c| c.url).unwrap_or_default();

        let password_hash = hash_password(request.password).await?;
        let id = ObjectId::new();
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash, refresh_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
        )
        .bind(&id)
        .bind(&username)
        .bind(&email)
        .bind(request.full_name.trim())
        .bind(&avatar.url)
        .bind(&cover_url)
        .bind(&password_hash)
        .bind(now)
        .execute(&self.db)
        .await;

        if let Err(e) = inserted {
            self.discard_media(&avatar.url).await;
            if !cover_url.is_empty() {
                self.discard_media(&cover_url).await;
            }
            return Err(duplicate_account(&e)
                .unwrap_or_else(|| ApiError::Internal(format!("Failed to register user: {}", e))));
        }

        tracing::info!(user_id = %id, username = %username, "Registered user");

        self.find_user(&id)
            .await?
            .ok_or_else(|| ApiError::Internal("Failed to register something went wrong".to_string()))
    }

    /// Authenticate by username or email and issue a fresh token pair
    pub async fn login(&self, request: LoginRequest) -> ApiResult<(PublicUser, TokenPair)> {
        let username = optional_text(request.username.as_deref()).map(|u| u.to_lowercase());
        let email = optional_text(request.email.as_deref());

        if username.is_none() && email.is_none() {
            return Err(ApiError::InvalidInput(
                "Username or email is required".to_string(),
            ));
        }

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, full_name, avatar, cover_image, password_hash,
                    refresh_token, created_at, updated_at
             FROM users WHERE username = ?1 OR email = ?2
             LIMIT 1",
        )
        .bind(&username)
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        let valid = verify_password(request.password, record.password_hash.clone()).await?;
        if !valid {
            tracing::warn!(user_id = %record.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
        }

        let tokens = self.tokens.issue_token_pair(&record.id).await?;

        Ok((PublicUser::from(record), tokens))
    }

    /// Clear the user's refresh token
    pub async fn logout(&self, user_id: &ObjectId) -> ApiResult<()> {
        self.tokens.invalidate(user_id).await
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &ObjectId,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        if new_password.trim().is_empty() {
            return Err(ApiError::InvalidInput("New password is required".to_string()));
        }

        let current: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        if !verify_password(old_password.to_string(), current).await? {
            return Err(ApiError::InvalidInput("Invalid old password".to_string()));
        }

        let password_hash = hash_password(new_password.to_string()).await?;
        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(())
    }

    /// Look up a user by id
    pub async fn find_user(&self, user_id: &ObjectId) -> ApiResult<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            PUBLIC_USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Update full name and email; both are required
    pub async fn update_account_details(
        &self,
        user_id: &ObjectId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<PublicUser> {
        let (Some(full_name), Some(email)) = (optional_text(full_name), optional_text(email)) else {
            return Err(ApiError::InvalidInput("All fields are required".to_string()));
        };
        require_email(&email)?;

        if self.email_exists(&email, Some(user_id)).await? {
            return Err(ApiError::InvalidInput("Email already exist".to_string()));
        }

        sqlx::query("UPDATE users SET full_name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&full_name)
            .bind(&email)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(|e| match duplicate_account(&e) {
                Some(_) => ApiError::InvalidInput("Email already exist".to_string()),
                None => ApiError::from(e),
            })?;

        self.require_user(user_id).await
    }

    /// Upload and set a new avatar; the old file is removed afterwards
    pub async fn update_avatar(&self, user_id: &ObjectId, file: &Path) -> ApiResult<PublicUser> {
        self.replace_image(user_id, file, ImageSlot::Avatar).await
    }

    /// Upload and set a new cover image; the old file is removed afterwards
    pub async fn update_cover_image(&self, user_id: &ObjectId, file: &Path) -> ApiResult<PublicUser> {
        self.replace_image(user_id, file, ImageSlot::CoverImage).await
    }

    /// Append a video to the user's watch history
    pub async fn record_watch(&self, user_id: &ObjectId, video_id: &ObjectId) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id, position, watched_at)
             VALUES (?1, ?2,
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM watch_history WHERE user_id = ?1),
                     ?3)",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn replace_image(
        &self,
        user_id: &ObjectId,
        file: &Path,
        slot: ImageSlot,
    ) -> ApiResult<PublicUser> {
        let previous = self.require_user(user_id).await?;
        let uploaded = self.media.upload(file).await?;

        let statement = match slot {
            ImageSlot::Avatar => "UPDATE users SET avatar = ?1, updated_at = ?2 WHERE id = ?3",
            ImageSlot::CoverImage => "UPDATE users SET cover_image = ?1, updated_at = ?2 WHERE id = ?3",
        };
        if let Err(e) = sqlx::query(statement)
            .bind(&uploaded.url)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await
        {
            self.discard_media(&uploaded.url).await;
            return Err(e.into());
        }

        let old_url = match slot {
            ImageSlot::Avatar => previous.avatar,
            ImageSlot::CoverImage => previous.cover_image,
        };
        if !old_url.is_empty() {
            self.discard_media(&old_url).await;
        }

        self.require_user(user_id).await
    }

    async fn require_user(&self, user_id: &ObjectId) -> ApiResult<PublicUser> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))
    }

    /// Best-effort removal of media that is no longer referenced
    async fn discard_media(&self, url: &str) {
        if let Err(e) = self.media.delete(url).await {
            tracing::warn!(url = %url, "Failed to remove orphaned media: {}", e);
        }
    }

    /// Check if username exists
    async fn username_exists(&self, username: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Check if email is used by any account other than `except`
    async fn email_exists(&self, email: &str, except: Option<&ObjectId>) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }
}

/// A UNIQUE violation on `users`, reported like the pre-insert checks
fn duplicate_account(e: &sqlx::Error) -> Option<ApiError> {
    let db = e.as_database_error().filter(|d| d.is_unique_violation())?;
    let message = if db.message().contains("users.email") {
        "User with email already exist"
    } else {
        "User with username already exist"
    };
    Some(ApiError::InvalidInput(message.to_string()))
}

#[derive(Clone, Copy)]
enum ImageSlot {
    Avatar,
    CoverImage,
}
