/// Aggregation query layer
///
/// Read-heavy views built as [`Pipeline`]s: channel profile, watch history,
/// and the paginated comment/video/playlist listings. Joined owner columns
/// come back flat and nullable; a missing owner becomes `owner: null`
/// instead of failing the query.
mod channel;
mod listings;
pub mod pagination;
pub mod pipeline;

pub use listings::{SortField, VideoSearch};
pub use pagination::{Page, Pagination};
pub use pipeline::{Bind, Direction, JoinKind, Pipeline};

use crate::{db::models::Visibility, ids::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Read-side service over the shared pool
#[derive(Clone)]
pub struct AggregateViews {
    db: SqlitePool,
}

impl AggregateViews {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Public subset of a user embedded in other documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

impl OwnerSummary {
    fn from_columns(
        id: Option<ObjectId>,
        username: Option<String>,
        full_name: Option<String>,
        avatar: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            id: id?,
            username: username?,
            full_name: full_name?,
            avatar: avatar?,
        })
    }
}

/// Channel page for one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
}

/// Video with its owner resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

/// Comment with its author resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: ObjectId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

/// Playlist listing entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: ObjectId,
    #[serde(rename = "owner")]
    pub owner_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub total_videos: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const VIDEO_FIELDS: &[&str] = &[
    "v.id",
    "v.title",
    "v.description",
    "v.video_file",
    "v.thumbnail",
    "v.duration",
    "v.views",
    "v.is_published",
    "v.created_at",
    "o.id AS owner_id",
    "o.username AS owner_username",
    "o.full_name AS owner_full_name",
    "o.avatar AS owner_avatar",
];

#[derive(FromRow)]
struct VideoRow {
    id: ObjectId,
    title: String,
    description: String,
    video_file: String,
    thumbnail: String,
    duration: f64,
    views: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    owner_id: Option<ObjectId>,
    owner_username: Option<String>,
    owner_full_name: Option<String>,
    owner_avatar: Option<String>,
}

impl From<VideoRow> for VideoSummary {
    fn from(row: VideoRow) -> Self {
        Self {
            owner: OwnerSummary::from_columns(
                row.owner_id,
                row.owner_username,
                row.owner_full_name,
                row.owner_avatar,
            ),
            id: row.id,
            title: row.title,
            description: row.description,
            video_file: row.video_file,
            thumbnail: row.thumbnail,
            duration: row.duration,
            views: row.views,
            is_published: row.is_published,
            created_at: row.created_at,
        }
    }
}
