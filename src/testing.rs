/// Fixtures shared by the unit tests
use crate::{
    config::{AuthConfig, CorsConfig, LoggingConfig, ServerConfig, ServiceConfig, StorageConfig},
    error::{ApiError, ApiResult},
    ids::ObjectId,
    media::{MediaStore, UploadedMedia},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 8000,
            public_url: "http://localhost:8000".to_string(),
            upload_limit: 10 * 1024 * 1024,
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            database: PathBuf::from(":memory:"),
            media_directory: PathBuf::from("./data/media"),
            temp_directory: std::env::temp_dir(),
        },
        authentication: AuthConfig {
            access_token_secret: "test-access-secret-key-for-testing-only".to_string(),
            access_token_expiry: Duration::from_secs(86_400),
            refresh_token_secret: "test-refresh-secret-key-for-testing-only".to_string(),
            refresh_token_expiry: Duration::from_secs(864_000),
            secure_cookies: true,
        },
        cors: CorsConfig {
            origin: "*".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

/// Insert a user row directly, bypassing registration
pub async fn insert_user(db: &SqlitePool, username: &str, email: &str) -> ObjectId {
    let id = ObjectId::new();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, '', 'not-a-hash', ?6, ?6)",
    )
    .bind(&id)
    .bind(username)
    .bind(email)
    .bind(format!("{} fullname", username))
    .bind(format!("http://media.test/{}.png", username))
    .bind(now)
    .execute(db)
    .await
    .unwrap();
    id
}

/// Insert a published video owned by `owner`
pub async fn insert_video(db: &SqlitePool, owner: &ObjectId, title: &str) -> ObjectId {
    let id = ObjectId::new();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO videos (id, owner_id, title, description, video_file, thumbnail, duration, views, is_published, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'description', 'http://media.test/v.mp4', 'http://media.test/t.png', 60, 0, 1, ?4, ?4)",
    )
    .bind(&id)
    .bind(owner)
    .bind(title)
    .bind(now)
    .execute(db)
    .await
    .unwrap();
    id
}

/// Turn a video back into a draft
pub async fn unpublish(db: &SqlitePool, video: &ObjectId) {
    sqlx::query("UPDATE videos SET is_published = 0 WHERE id = ?1")
        .bind(video)
        .execute(db)
        .await
        .unwrap();
}

/// Insert a comment on `video` by `owner`
pub async fn insert_comment(db: &SqlitePool, video: &ObjectId, owner: &ObjectId, content: &str) -> ObjectId {
    let id = ObjectId::new();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )
    .bind(&id)
    .bind(video)
    .bind(owner)
    .bind(content)
    .bind(now)
    .execute(db)
    .await
    .unwrap();
    id
}

/// Record that `subscriber` follows `channel`
pub async fn subscribe(db: &SqlitePool, subscriber: &ObjectId, channel: &ObjectId) {
    sqlx::query(
        "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(ObjectId::new())
    .bind(subscriber)
    .bind(channel)
    .bind(Utc::now())
    .execute(db)
    .await
    .unwrap();
}

/// Media store that records uploads in memory and can be told to fail
#[derive(Default)]
pub struct StubMediaStore {
    counter: AtomicUsize,
    fail: AtomicBool,
    pub deleted: Mutex<Vec<String>>,
}

impl StubMediaStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn deleted_urls(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for StubMediaStore {
    async fn upload(&self, local_path: &Path) -> ApiResult<UploadedMedia> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::UploadFailed("stub refused upload".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(UploadedMedia {
            url: format!("http://media.test/{}/{}", n, name),
            duration: Some(42.5),
        })
    }

    async fn delete(&self, url: &str) -> ApiResult<()> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// A path for handing to the stub store; the stub never reads it
pub fn staged(name: &str) -> PathBuf {
    PathBuf::from("/tmp/staged").join(name)
}
