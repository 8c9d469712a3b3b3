/// Video publishing and lifecycle
use super::{PublishVideoRequest, UpdateVideoRequest};
use crate::{
    account::AccountManager,
    db::models::{LikeKind, Video},
    error::{ApiError, ApiResult},
    ids::{ensure_owner, is_owner, ObjectId},
    media::MediaStore,
    validation::{optional_text, require_text},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_file, thumbnail, duration, views, is_published, created_at, updated_at";

/// Video manager
pub struct VideoManager {
    db: SqlitePool,
    media: Arc<dyn MediaStore>,
    accounts: Arc<AccountManager>,
}

impl VideoManager {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>, accounts: Arc<AccountManager>) -> Self {
        Self {
            db,
            media,
            accounts,
        }
    }

    /// Upload the video and thumbnail, then create the record
    pub async fn publish(
        &self,
        owner: &ObjectId,
        request: PublishVideoRequest,
        video_file: Option<&Path>,
        thumbnail: Option<&Path>,
    ) -> ApiResult<Video> {
        let title = require_text(request.title.as_deref(), "Title is required")?;
        let description = require_text(request.description.as_deref(), "Description is required")?;
        let video_file =
            video_file.ok_or_else(|| ApiError::InvalidInput("Video file is required".to_string()))?;
        let thumbnail = thumbnail
            .ok_or_else(|| ApiError::InvalidInput("Thumbnail file is required".to_string()))?;

        let uploaded_video = self.media.upload(video_file).await?;
        let uploaded_thumbnail = match self.media.upload(thumbnail).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                self.discard_media(&uploaded_video.url).await;
                return Err(e);
            }
        };

        let id = ObjectId::new();
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO videos (id, owner_id, title, description, video_file, thumbnail, duration, views, is_published, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 1, ?8, ?8)",
        )
        .bind(&id)
        .bind(owner)
        .bind(&title)
        .bind(&description)
        .bind(&uploaded_video.url)
        .bind(&uploaded_thumbnail.url)
        .bind(uploaded_video.duration.unwrap_or(0.0))
        .bind(now)
        .execute(&self.db)
        .await;

        if let Err(e) = inserted {
            self.discard_media(&uploaded_video.url).await;
            self.discard_media(&uploaded_thumbnail.url).await;
            return Err(ApiError::from_store("Failed to publish video")(e));
        }

        tracing::info!(video_id = %id, owner = %owner, "Published video");

        self.require(&id).await
    }

    /// Fetch a video. Unpublished videos exist only for their owner.
    ///
    /// An authenticated viewer counts as a view and the video is appended to
    /// their watch history.
    pub async fn get(&self, video_id: &ObjectId, viewer: Option<&ObjectId>) -> ApiResult<Video> {
        let video = self.require(video_id).await?;

        let viewer_owns = viewer.is_some_and(|viewer| is_owner(viewer, &video.owner_id));
        if !video.is_published && !viewer_owns {
            return Err(ApiError::NotFound("Video does not exist".to_string()));
        }

        let Some(viewer) = viewer else {
            return Ok(video);
        };

        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?1")
            .bind(video_id)
            .execute(&self.db)
            .await?;
        self.accounts.record_watch(viewer, video_id).await?;

        self.require(video_id).await
    }

    /// Update title, description and/or thumbnail
    pub async fn update(
        &self,
        actor: &ObjectId,
        video_id: &ObjectId,
        request: UpdateVideoRequest,
        thumbnail: Option<&Path>,
    ) -> ApiResult<Video> {
        let title = optional_text(request.title.as_deref());
        let description = optional_text(request.description.as_deref());
        if title.is_none() && description.is_none() && thumbnail.is_none() {
            return Err(ApiError::InvalidInput(
                "Provide a title, description or thumbnail to update".to_string(),
            ));
        }

        let video = self.require(video_id).await?;
        ensure_owner(actor, &video.owner_id, "video")?;

        let new_thumbnail = match thumbnail {
            Some(path) => Some(self.media.upload(path).await?),
            None => None,
        };

        let updated = sqlx::query(
            "UPDATE videos SET title = ?1, description = ?2, thumbnail = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(title.as_deref().unwrap_or(&video.title))
        .bind(description.as_deref().unwrap_or(&video.description))
        .bind(
            new_thumbnail
                .as_ref()
                .map(|t| t.url.as_str())
                .unwrap_or(&video.thumbnail),
        )
        .bind(Utc::now())
        .bind(video_id)
        .execute(&self.db)
        .await;

        match (updated, new_thumbnail) {
            (Err(e), Some(uploaded)) => {
                self.discard_media(&uploaded.url).await;
                return Err(ApiError::from_store("Failed to update video")(e));
            }
            (Err(e), None) => return Err(ApiError::from_store("Failed to update video")(e)),
            (Ok(_), Some(_)) => self.discard_media(&video.thumbnail).await,
            (Ok(_), None) => {}
        }

        tracing::info!(video_id = %video_id, "Updated video");

        self.require(video_id).await
    }

    /// Delete a video with its comments, likes and playlist entries
    pub async fn delete(&self, actor: &ObjectId, video_id: &ObjectId) -> ApiResult<()> {
        let video = self.require(video_id).await?;
        ensure_owner(actor, &video.owner_id, "video")?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(ApiError::from_store("Failed to delete video"))?;
        sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(video_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete video"))?;
        sqlx::query(
            "DELETE FROM likes WHERE (target_kind = ?1 AND target_id = ?2)
                OR (target_kind = ?3 AND target_id IN (SELECT id FROM comments WHERE video_id = ?2))",
        )
        .bind(LikeKind::Video)
        .bind(video_id)
        .bind(LikeKind::Comment)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::from_store("Failed to delete video"))?;
        sqlx::query("DELETE FROM comments WHERE video_id = ?1")
            .bind(video_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete video"))?;
        sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?1")
            .bind(video_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete video"))?;
        tx.commit()
            .await
            .map_err(ApiError::from_store("Failed to delete video"))?;

        self.discard_media(&video.video_file).await;
        self.discard_media(&video.thumbnail).await;

        tracing::info!(video_id = %video_id, "Deleted video");

        Ok(())
    }

    /// Flip `is_published`
    pub async fn toggle_publish(&self, actor: &ObjectId, video_id: &ObjectId) -> ApiResult<Video> {
        let video = self.require(video_id).await?;
        ensure_owner(actor, &video.owner_id, "video")?;

        sqlx::query("UPDATE videos SET is_published = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(!video.is_published)
            .bind(Utc::now())
            .bind(video_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::from_store("Failed to toggle publish status"))?;

        self.require(video_id).await
    }

    /// Load a video regardless of publish state
    pub async fn find(&self, video_id: &ObjectId) -> ApiResult<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = ?1",
            VIDEO_COLUMNS
        ))
        .bind(video_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(video)
    }

    async fn require(&self, video_id: &ObjectId) -> ApiResult<Video> {
        self.find(video_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Video does not exist".to_string()))
    }

    async fn discard_media(&self, url: &str) {
        if let Err(e) = self.media.delete(url).await {
            tracing::warn!(url = %url, "Failed to remove media: {}", e);
        }
    }
}
