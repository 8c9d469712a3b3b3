/// Application context and dependency injection
use crate::{
    account::{AccountManager, TokenService},
    aggregate::AggregateViews,
    config::ServerConfig,
    content::{CommentManager, LikeManager, PlaylistManager, SubscriptionManager, VideoManager},
    db,
    error::{ApiError, ApiResult},
    media::{DiskMediaStore, MediaStore},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub media: Arc<dyn MediaStore>,
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountManager>,
    pub views: AggregateViews,
    pub videos: Arc<VideoManager>,
    pub comments: Arc<CommentManager>,
    pub playlists: Arc<PlaylistManager>,
    pub likes: Arc<LikeManager>,
    pub subscriptions: Arc<SubscriptionManager>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let media: Arc<dyn MediaStore> = Arc::new(DiskMediaStore::new(
            config.storage.media_directory.clone(),
            config.service.public_url.clone(),
        ));

        Ok(Self::with_services(config, db, media))
    }

    /// Wire the services over an existing pool and media store
    pub fn with_services(config: ServerConfig, db: SqlitePool, media: Arc<dyn MediaStore>) -> Self {
        let tokens = Arc::new(TokenService::new(db.clone(), config.authentication.clone()));
        let accounts = Arc::new(AccountManager::new(db.clone(), tokens.clone(), media.clone()));
        let views = AggregateViews::new(db.clone());

        let videos = Arc::new(VideoManager::new(db.clone(), media.clone(), accounts.clone()));
        let comments = Arc::new(CommentManager::new(db.clone(), views.clone()));
        let playlists = Arc::new(PlaylistManager::new(db.clone(), views.clone()));
        let likes = Arc::new(LikeManager::new(db.clone(), views.clone()));
        let subscriptions = Arc::new(SubscriptionManager::new(db.clone()));

        Self {
            config: Arc::new(config),
            db,
            media,
            tokens,
            accounts,
            views,
            videos,
            comments,
            playlists,
            likes,
            subscriptions,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ApiResult<()> {
        let dirs = [
            &config.storage.data_directory,
            &config.storage.media_directory,
            &config.storage.temp_directory,
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    ApiError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }
}
