/// Channel profile and watch history
use super::{AggregateViews, ChannelProfile, JoinKind, Pipeline, VideoRow, VideoSummary, VIDEO_FIELDS};
use crate::{
    aggregate::Direction,
    error::{ApiError, ApiResult},
    ids::ObjectId,
};

impl AggregateViews {
    /// Channel page by username (case-insensitive).
    ///
    /// `is_subscribed` reports whether `requester` subscribes to the channel;
    /// anonymous requests always see `false`.
    pub async fn channel_profile(
        &self,
        username: &str,
        requester: Option<&ObjectId>,
    ) -> ApiResult<ChannelProfile> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(ApiError::InvalidInput("username is missing".to_string()));
        }

        Pipeline::over("users", "u")
            .match_eq("u.username", username)
            .project(&[
                "u.id",
                "u.username",
                "u.email",
                "u.full_name",
                "u.avatar",
                "u.cover_image",
                "u.created_at",
            ])
            .add_count("subscribers_count", "subscriptions", "channel_id", "u.id")
            .add_count(
                "channels_subscribed_to_count",
                "subscriptions",
                "subscriber_id",
                "u.id",
            )
            .add_exists(
                "is_subscribed",
                "subscriptions",
                "channel_id",
                "u.id",
                "subscriber_id",
                requester,
            )
            .fetch_optional::<ChannelProfile>(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("channel does not exists".to_string()))
    }

    /// Watched videos in the order they were watched. Videos deleted or
    /// unpublished since are skipped; a deleted owner leaves `owner` empty.
    pub async fn watch_history(&self, user_id: &ObjectId) -> ApiResult<Vec<VideoSummary>> {
        let rows = Pipeline::over("watch_history", "h")
            .lookup(JoinKind::Inner, "videos", "v", "id", "h.video_id")
            .lookup(JoinKind::Left, "users", "o", "id", "v.owner_id")
            .match_eq("h.user_id", user_id)
            .match_either("v.is_published", true, "v.owner_id", user_id)
            .project(VIDEO_FIELDS)
            .sort("h.position", Direction::Asc)
            .fetch_all::<VideoRow>(&self.db)
            .await?;

        Ok(rows.into_iter().map(VideoSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_user, insert_video, subscribe, unpublish};
    use sqlx::SqlitePool;

    async fn setup() -> (AggregateViews, SqlitePool) {
        let db = crate::db::create_memory_pool().await.unwrap();
        (AggregateViews::new(db.clone()), db)
    }

    async fn watch(db: &SqlitePool, user: &ObjectId, video: &ObjectId) {
        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id, position, watched_at)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM watch_history WHERE user_id = ?1), CURRENT_TIMESTAMP)",
        )
        .bind(user)
        .bind(video)
        .execute(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_channel_profile_counts_and_is_subscribed() {
        let (views, db) = setup().await;
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let bob = insert_user(&db, "bob", "b@x.com").await;
        let carol = insert_user(&db, "carol", "c@x.com").await;

        subscribe(&db, &bob, &alice).await;
        subscribe(&db, &carol, &alice).await;
        subscribe(&db, &alice, &carol).await;

        let as_bob = views.channel_profile("ALICE", Some(&bob)).await.unwrap();
        assert_eq!(as_bob.id, alice);
        assert_eq!(as_bob.subscribers_count, 2);
        assert_eq!(as_bob.channels_subscribed_to_count, 1);
        assert!(as_bob.is_subscribed);

        let as_alice = views.channel_profile("alice", Some(&alice)).await.unwrap();
        assert!(!as_alice.is_subscribed);

        let anonymous = views.channel_profile("alice", None).await.unwrap();
        assert!(!anonymous.is_subscribed);

        let bob_channel = views.channel_profile("bob", Some(&alice)).await.unwrap();
        assert_eq!(bob_channel.subscribers_count, 0);
        assert!(!bob_channel.is_subscribed);
    }

    #[tokio::test]
    async fn test_channel_profile_missing() {
        let (views, _) = setup().await;
        assert!(matches!(
            views.channel_profile("ghost", None).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            views.channel_profile("  ", None).await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_channel_profile_hides_credentials() {
        let (views, db) = setup().await;
        insert_user(&db, "alice", "a@x.com").await;

        let profile = views.channel_profile("alice", None).await.unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["subscribersCount"], 0);
    }

    #[tokio::test]
    async fn test_watch_history_preserves_order_and_skips_deleted() {
        let (views, db) = setup().await;
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let bob = insert_user(&db, "bob", "b@x.com").await;
        let first = insert_video(&db, &bob, "first").await;
        let second = insert_video(&db, &bob, "second").await;
        let gone = insert_video(&db, &bob, "gone").await;

        watch(&db, &alice, &second).await;
        watch(&db, &alice, &gone).await;
        watch(&db, &alice, &first).await;
        watch(&db, &alice, &second).await;

        sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(&gone)
            .execute(&db)
            .await
            .unwrap();

        let history = views.watch_history(&alice).await.unwrap();
        let titles: Vec<_> = history.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first", "second"]);

        let owner = history[0].owner.as_ref().unwrap();
        assert_eq!(owner.username, "bob");

        assert!(views.watch_history(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_history_with_deleted_owner() {
        let (views, db) = setup().await;
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let bob = insert_user(&db, "bob", "b@x.com").await;
        let video = insert_video(&db, &bob, "orphan").await;
        watch(&db, &alice, &video).await;

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(&bob)
            .execute(&db)
            .await
            .unwrap();

        let history = views.watch_history(&alice).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].owner.is_none());
    }

    #[tokio::test]
    async fn test_watch_history_hides_unpublished_videos() {
        let (views, db) = setup().await;
        let alice = insert_user(&db, "alice", "a@x.com").await;
        let bob = insert_user(&db, "bob", "b@x.com").await;
        let draft = insert_video(&db, &bob, "pulled").await;
        let kept = insert_video(&db, &bob, "kept").await;
        watch(&db, &alice, &draft).await;
        watch(&db, &alice, &kept).await;
        watch(&db, &bob, &draft).await;
        unpublish(&db, &draft).await;

        let history = views.watch_history(&alice).await.unwrap();
        let titles: Vec<_> = history.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["kept"]);

        // The owner still sees their own draft
        let own = views.watch_history(&bob).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].title, "pulled");
    }
}
