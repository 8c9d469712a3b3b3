/// Comments on videos
use super::CommentRequest;
use crate::{
    aggregate::AggregateViews,
    db::models::{Comment, LikeKind},
    error::{ApiError, ApiResult},
    ids::{ensure_owner, ObjectId},
    validation::require_text,
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct CommentManager {
    db: SqlitePool,
    views: AggregateViews,
}

impl CommentManager {
    pub fn new(db: SqlitePool, views: AggregateViews) -> Self {
        Self { db, views }
    }

    /// Comment on a video the actor can see
    pub async fn add(
        &self,
        actor: &ObjectId,
        video_id: &ObjectId,
        request: CommentRequest,
    ) -> ApiResult<Comment> {
        let content = require_text(request.content.as_deref(), "Comment content is required")?;

        self.views.require_visible_video(video_id, Some(actor)).await?;

        let id = ObjectId::new();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        )
        .bind(&id)
        .bind(video_id)
        .bind(actor)
        .bind(&content)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to add comment"))?;

        tracing::debug!(comment_id = %id, video_id = %video_id, "Added comment");

        self.get(&id).await
    }

    pub async fn get(&self, comment_id: &ObjectId) -> ApiResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, video_id, owner_id, content, created_at, updated_at FROM comments WHERE id = ?1",
        )
        .bind(comment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
    }

    pub async fn update(
        &self,
        actor: &ObjectId,
        comment_id: &ObjectId,
        request: CommentRequest,
    ) -> ApiResult<Comment> {
        let content = require_text(request.content.as_deref(), "Comment content is required")?;
        let comment = self.get(comment_id).await?;
        ensure_owner(actor, &comment.owner_id, "comment")?;

        sqlx::query("UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&content)
            .bind(Utc::now())
            .bind(comment_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::from_store("Failed to update comment"))?;

        self.get(comment_id).await
    }

    /// Delete a comment and the likes on it
    pub async fn delete(&self, actor: &ObjectId, comment_id: &ObjectId) -> ApiResult<()> {
        let comment = self.get(comment_id).await?;
        ensure_owner(actor, &comment.owner_id, "comment")?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(ApiError::from_store("Failed to delete comment"))?;
        sqlx::query("DELETE FROM comments WHERE id = ?1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete comment"))?;
        sqlx::query("DELETE FROM likes WHERE target_kind = ?1 AND target_id = ?2")
            .bind(LikeKind::Comment)
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::from_store("Failed to delete comment"))?;
        tx.commit()
            .await
            .map_err(ApiError::from_store("Failed to delete comment"))?;

        tracing::debug!(comment_id = %comment_id, "Deleted comment");

        Ok(())
    }
}
