/// Channel subscriptions
use crate::{
    error::{ApiError, ApiResult},
    ids::{is_owner, ObjectId},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
}

pub struct SubscriptionManager {
    db: SqlitePool,
}

impl SubscriptionManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Subscribe to `channel`, or unsubscribe if already subscribed
    pub async fn toggle(&self, subscriber: &ObjectId, channel: &ObjectId) -> ApiResult<SubscriptionStatus> {
        if is_owner(subscriber, channel) {
            return Err(ApiError::InvalidInput(
                "You cannot subscribe to your own channel".to_string(),
            ));
        }

        let channel_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
            .bind(channel)
            .fetch_one(&self.db)
            .await?;
        if channel_exists == 0 {
            return Err(ApiError::NotFound("channel does not exists".to_string()));
        }

        let removed = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2")
            .bind(subscriber)
            .bind(channel)
            .execute(&self.db)
            .await?
            .rows_affected();

        if removed > 0 {
            tracing::debug!(subscriber = %subscriber, channel = %channel, "Unsubscribed");
            return Ok(SubscriptionStatus {
                is_subscribed: false,
            });
        }

        sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(ObjectId::new())
        .bind(subscriber)
        .bind(channel)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(ApiError::from_store("Failed to subscribe"))?;

        tracing::debug!(subscriber = %subscriber, channel = %channel, "Subscribed");

        Ok(SubscriptionStatus {
            is_subscribed: true,
        })
    }
}
