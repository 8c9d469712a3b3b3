/// Likes on videos, comments and tweets
use crate::{
    aggregate::{AggregateViews, Page, Pagination, VideoSummary},
    db::models::LikeKind,
    error::{ApiError, ApiResult},
    ids::ObjectId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// What is being liked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    pub fn kind(&self) -> LikeKind {
        match self {
            LikeTarget::Video(_) => LikeKind::Video,
            LikeTarget::Comment(_) => LikeKind::Comment,
            LikeTarget::Tweet(_) => LikeKind::Tweet,
        }
    }

    pub fn id(&self) -> &ObjectId {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub is_liked: bool,
}

pub struct LikeManager {
    db: SqlitePool,
    views: AggregateViews,
}

impl LikeManager {
    pub fn new(db: SqlitePool, views: AggregateViews) -> Self {
        Self { db, views }
    }

    /// Like the target, or remove the like if the actor already has one
    pub async fn toggle(&self, actor: &ObjectId, target: LikeTarget) -> ApiResult<LikeStatus> {
        self.ensure_target_exists(actor, &target).await?;

        let removed = sqlx::query(
            "DELETE FROM likes WHERE liked_by = ?1 AND target_kind = ?2 AND target_id = ?3",
        )
        .bind(actor)
        .bind(target.kind())
        .bind(target.id())
        .execute(&self.db)
        .await?
        .rows_affected();

        if removed > 0 {
            tracing::debug!(actor = %actor, kind = target.kind().as_str(), target = %target.id(), "Removed like");
            return Ok(LikeStatus { is_liked: false });
        }

        sqlx::query(
            "INSERT INTO likes (id, liked_by, target_kind, target_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(ObjectId::new())
        .bind(actor)
        .bind(target.kind())
        .bind(target.id())
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to like"))?;

        tracing::debug!(actor = %actor, kind = target.kind().as_str(), target = %target.id(), "Added like");

        Ok(LikeStatus { is_liked: true })
    }

    pub async fn liked_videos(
        &self,
        actor: &ObjectId,
        pagination: Pagination,
    ) -> ApiResult<Page<VideoSummary>> {
        self.views.liked_videos(actor, pagination).await
    }

    /// Videos and comments must exist; tweets are not stored here
    /// Tweets have no backing table, so any tweet id is accepted
    async fn ensure_target_exists(&self, actor: &ObjectId, target: &LikeTarget) -> ApiResult<()> {
        match target {
            LikeTarget::Video(id) => self.views.require_visible_video(id, Some(actor)).await,
            LikeTarget::Comment(id) => self.views.require_visible_comment(id, Some(actor)).await,
            LikeTarget::Tweet(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_comment, insert_user, insert_video, unpublish};

    #[tokio::test]
    async fn test_toggle_video_like() {
        let db = crate::db::create_memory_pool().await.unwrap();
        let likes = LikeManager::new(db.clone(), AggregateViews::new(db.clone()));
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let video = insert_video(&db, &alice, "clip").await;

        let liked = likes.toggle(&alice, LikeTarget::Video(video.clone())).await.unwrap();
        assert!(liked.is_liked);
        let page = likes.liked_videos(&alice, Pagination::default()).await.unwrap();
        assert_eq!(page.docs.len(), 1);

        let unliked = likes.toggle(&alice, LikeTarget::Video(video)).await.unwrap();
        assert!(!unliked.is_liked);
        let page = likes.liked_videos(&alice, Pagination::default()).await.unwrap();
        assert!(page.docs.is_empty());
    }

    #[tokio::test]
    async fn test_targets_are_independent() {
        let db = crate::db::create_memory_pool().await.unwrap();
        let likes = LikeManager::new(db.clone(), AggregateViews::new(db.clone()));
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let video = insert_video(&db, &alice, "clip").await;
        let comment = insert_comment(&db, &video, &alice, "hi").await;

        assert!(likes.toggle(&alice, LikeTarget::Comment(comment)).await.unwrap().is_liked);
        assert!(likes.toggle(&alice, LikeTarget::Tweet(ObjectId::new())).await.unwrap().is_liked);
        assert!(likes.toggle(&alice, LikeTarget::Video(video)).await.unwrap().is_liked);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let db = crate::db::create_memory_pool().await.unwrap();
        let likes = LikeManager::new(db.clone(), AggregateViews::new(db.clone()));
        let alice = insert_user(&db, "alice", "a@x.com").await;

        assert!(matches!(
            likes.toggle(&alice, LikeTarget::Video(ObjectId::new())).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            likes.toggle(&alice, LikeTarget::Comment(ObjectId::new())).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_drafts_only_likeable_by_owner() {
        let db = crate::db::create_memory_pool().await.unwrap();
        let likes = LikeManager::new(db.clone(), AggregateViews::new(db.clone()));
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let bob = insert_user(&db, "bob", "b@x.com").await;
        let draft = insert_video(&db, &alice, "secret draft").await;
        let comment = insert_comment(&db, &draft, &alice, "hi").await;
        unpublish(&db, &draft).await;

        assert!(matches!(
            likes.toggle(&bob, LikeTarget::Video(draft.clone())).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            likes.toggle(&bob, LikeTarget::Comment(comment.clone())).await,
            Err(ApiError::NotFound(_))
        ));

        assert!(likes.toggle(&alice, LikeTarget::Video(draft)).await.unwrap().is_liked);
        assert!(likes.toggle(&alice, LikeTarget::Comment(comment)).await.unwrap().is_liked);
        let page = likes.liked_videos(&alice, Pagination::default()).await.unwrap();
        assert_eq!(page.docs.len(), 1);
    }
}
