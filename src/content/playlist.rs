/// Playlists: an owner, a visibility and an ordered list of videos
use super::{CreatePlaylistRequest, UpdatePlaylistRequest};
use crate::{
    aggregate::{AggregateViews, Page, Pagination, PlaylistSummary, VideoSummary},
    db::models::{Playlist, Visibility},
    error::{ApiError, ApiResult},
    ids::{ensure_owner, is_owner, ObjectId},
    validation::{optional_text, require_text},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Playlist with its videos resolved, in playlist order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<VideoSummary>,
}

pub struct PlaylistManager {
    db: SqlitePool,
    views: AggregateViews,
}

impl PlaylistManager {
    pub fn new(db: SqlitePool, views: AggregateViews) -> Self {
        Self { db, views }
    }

    /// Create an empty playlist; visibility defaults to Private
    pub async fn create(&self, owner: &ObjectId, request: CreatePlaylistRequest) -> ApiResult<Playlist> {
        let title = require_text(request.title.as_deref(), "Title is required")?;
        let description = optional_text(request.description.as_deref());
        let visibility = request.visibility.unwrap_or_default();

        let id = ObjectId::new();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO playlists (id, owner_id, title, description, visibility, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        )
        .bind(&id)
        .bind(owner)
        .bind(&title)
        .bind(&description)
        .bind(visibility)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to create playlist"))?;

        tracing::info!(playlist_id = %id, owner = %owner, "Created playlist");

        self.require(&id).await
    }

    /// Private playlists are visible only to their owner
    pub async fn get(&self, playlist_id: &ObjectId, viewer: Option<&ObjectId>) -> ApiResult<PlaylistDetail> {
        let playlist = self.require(playlist_id).await?;

        let viewer_owns = viewer.is_some_and(|viewer| is_owner(viewer, &playlist.owner_id));
        if playlist.visibility == Visibility::Private && !viewer_owns {
            return Err(ApiError::NotFound("The playlist does not exist".to_string()));
        }

        let videos = self.views.playlist_videos(playlist_id, viewer).await?;
        Ok(PlaylistDetail { playlist, videos })
    }

    pub async fn list_for_user(
        &self,
        owner: &ObjectId,
        viewer: Option<&ObjectId>,
        pagination: Pagination,
    ) -> ApiResult<Page<PlaylistSummary>> {
        self.views.user_playlists(owner, viewer, pagination).await
    }

    pub async fn update(
        &self,
        actor: &ObjectId,
        playlist_id: &ObjectId,
        request: UpdatePlaylistRequest,
    ) -> ApiResult<Playlist> {
        let playlist = self.require(playlist_id).await?;
        ensure_owner(actor, &playlist.owner_id, "playlist")?;

        let title = optional_text(request.title.as_deref()).unwrap_or(playlist.title);
        let description = optional_text(request.description.as_deref()).or(playlist.description);
        let visibility = request.visibility.unwrap_or(playlist.visibility);

        sqlx::query(
            "UPDATE playlists SET title = ?1, description = ?2, visibility = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(&title)
        .bind(&description)
        .bind(visibility)
        .bind(Utc::now())
        .bind(playlist_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to update playlist"))?;

        self.require(playlist_id).await
    }

    pub async fn delete(&self, actor: &ObjectId, playlist_id: &ObjectId) -> ApiResult<()> {
        let playlist = self.require(playlist_id).await?;
        ensure_owner(actor, &playlist.owner_id, "playlist")?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(ApiError::from_store("Failed to delete playlist"))?;
        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?1")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete playlist"))?;
        sqlx::query("DELETE FROM playlists WHERE id = ?1")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete playlist"))?;
        tx.commit()
            .await
            .map_err(ApiError::from_store("Failed to delete playlist"))?;

        tracing::info!(playlist_id = %playlist_id, "Deleted playlist");

        Ok(())
    }

    /// Append a video. The same video may appear more than once.
    pub async fn add_video(
        &self,
        actor: &ObjectId,
        playlist_id: &ObjectId,
        video_id: &ObjectId,
    ) -> ApiResult<PlaylistDetail> {
        let playlist = self.check_linkage(actor, playlist_id, video_id).await?;

        sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM playlist_videos WHERE playlist_id = ?1))",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to add video to playlist"))?;

        self.touch(playlist_id).await?;
        self.get(playlist_id, Some(&playlist.owner_id)).await
    }

    /// Remove every occurrence of a video
    pub async fn remove_video(
        &self,
        actor: &ObjectId,
        playlist_id: &ObjectId,
        video_id: &ObjectId,
    ) -> ApiResult<PlaylistDetail> {
        let playlist = self.check_linkage(actor, playlist_id, video_id).await?;

        let removed = sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::from_store("Failed to remove video from playlist"))?
            .rows_affected();

        tracing::debug!(playlist_id = %playlist_id, video_id = %video_id, removed, "Removed video from playlist");

        self.touch(playlist_id).await?;
        self.get(playlist_id, Some(&playlist.owner_id)).await
    }

    /// Playlist and video must exist, the actor must own the playlist and
    /// the video must belong to the playlist's owner
    async fn check_linkage(
        &self,
        actor: &ObjectId,
        playlist_id: &ObjectId,
        video_id: &ObjectId,
    ) -> ApiResult<Playlist> {
        let playlist = self.require(playlist_id).await?;

        let video_owner: ObjectId = sqlx::query_scalar("SELECT owner_id FROM videos WHERE id = ?1")
            .bind(video_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("The video does not exist".to_string()))?;

        ensure_owner(actor, &playlist.owner_id, "playlist")?;
        if !is_owner(&video_owner, &playlist.owner_id) {
            return Err(ApiError::Forbidden(
                "Only the playlist owner's videos can be linked to it".to_string(),
            ));
        }

        Ok(playlist)
    }

    async fn touch(&self, playlist_id: &ObjectId) -> ApiResult<()> {
        sqlx::query("UPDATE playlists SET updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(playlist_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn require(&self, playlist_id: &ObjectId) -> ApiResult<Playlist> {
        sqlx::query_as::<_, Playlist>(
            "SELECT id, owner_id, title, description, visibility, created_at, updated_at
             FROM playlists WHERE id = ?1",
        )
        .bind(playlist_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("The playlist does not exist".to_string()))
    }
}
