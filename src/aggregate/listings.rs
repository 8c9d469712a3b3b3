/// Paginated listings: comments on a video, video search, playlists, likes
use super::{
    AggregateViews, CommentView, OwnerSummary, Page, Pagination, PlaylistSummary, VideoRow,
    VideoSummary, VIDEO_FIELDS,
};
use crate::{
    aggregate::{Direction, JoinKind, Pipeline},
    db::models::LikeKind,
    error::{ApiError, ApiResult},
    ids::{is_owner, ObjectId},
    validation::optional_text,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Fields a video search may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl SortField {
    pub fn parse(raw: &str) -> ApiResult<Self> {
        match raw.trim() {
            "createdAt" => Ok(SortField::CreatedAt),
            "views" => Ok(SortField::Views),
            "duration" => Ok(SortField::Duration),
            "title" => Ok(SortField::Title),
            other => Err(ApiError::InvalidInput(format!(
                "Cannot sort videos by '{}'",
                other
            ))),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "v.created_at",
            SortField::Views => "v.views",
            SortField::Duration => "v.duration",
            SortField::Title => "v.title",
        }
    }
}

/// Video search filters
#[derive(Debug, Clone, Default)]
pub struct VideoSearch {
    /// Case-insensitive substring of the title
    pub query: Option<String>,
    pub owner: Option<ObjectId>,
    pub sort: Option<(SortField, Direction)>,
}

impl VideoSearch {
    /// Build from raw query parameters (`query`, `userId`, `sortBy`, `sortType`)
    pub fn from_params(
        query: Option<&str>,
        user_id: Option<&str>,
        sort_by: Option<&str>,
        sort_type: Option<&str>,
    ) -> ApiResult<Self> {
        let owner = optional_text(user_id)
            .map(|raw| ObjectId::parse(&raw, "user"))
            .transpose()?;

        let direction = match optional_text(sort_type) {
            Some(raw) => Some(Direction::parse(&raw).ok_or_else(|| {
                ApiError::InvalidInput("sortType must be asc or desc".to_string())
            })?),
            None => None,
        };

        let sort = match optional_text(sort_by) {
            Some(raw) => Some((SortField::parse(&raw)?, direction.unwrap_or_default())),
            None => direction.map(|d| (SortField::CreatedAt, d)),
        };

        Ok(Self {
            query: optional_text(query),
            owner,
            sort,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: ObjectId,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Option<ObjectId>,
    owner_username: Option<String>,
    owner_full_name: Option<String>,
    owner_avatar: Option<String>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            owner: OwnerSummary::from_columns(
                row.owner_id,
                row.owner_username,
                row.owner_full_name,
                row.owner_avatar,
            ),
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl AggregateViews {
    /// `NotFound` unless the video exists and is published or owned by `viewer`
    pub async fn require_visible_video(
        &self,
        video_id: &ObjectId,
        viewer: Option<&ObjectId>,
    ) -> ApiResult<()> {
        let visible = Pipeline::over("videos", "v")
            .match_eq("v.id", video_id)
            .match_either("v.is_published", true, "v.owner_id", viewer)
            .fetch_count(&self.db)
            .await?;

        if visible == 0 {
            return Err(ApiError::NotFound("Video not found".to_string()));
        }
        Ok(())
    }

    /// `NotFound` unless the comment exists on a video `viewer` can see
    pub async fn require_visible_comment(
        &self,
        comment_id: &ObjectId,
        viewer: Option<&ObjectId>,
    ) -> ApiResult<()> {
        let visible = Pipeline::over("comments", "c")
            .lookup(JoinKind::Inner, "videos", "v", "id", "c.video_id")
            .match_eq("c.id", comment_id)
            .match_either("v.is_published", true, "v.owner_id", viewer)
            .fetch_count(&self.db)
            .await?;

        if visible == 0 {
            return Err(ApiError::NotFound("Comment not found".to_string()));
        }
        Ok(())
    }

    /// Comments on a video, oldest first, with their authors
    pub async fn video_comments(
        &self,
        video_id: &ObjectId,
        viewer: Option<&ObjectId>,
        pagination: Pagination,
    ) -> ApiResult<Page<CommentView>> {
        self.require_visible_video(video_id, viewer).await?;

        let page = Pipeline::over("comments", "c")
            .lookup(JoinKind::Left, "users", "o", "id", "c.owner_id")
            .match_eq("c.video_id", video_id)
            .project(&[
                "c.id",
                "c.content",
                "c.created_at",
                "c.updated_at",
                "o.id AS owner_id",
                "o.username AS owner_username",
                "o.full_name AS owner_full_name",
                "o.avatar AS owner_avatar",
            ])
            .sort("c.rowid", Direction::Asc)
            .paginate::<CommentRow>(&self.db, pagination)
            .await?;

        Ok(page.map(CommentView::from))
    }

    /// Published videos matching `search`; insertion order unless a sort is given
    pub async fn search_videos(
        &self,
        search: &VideoSearch,
        pagination: Pagination,
    ) -> ApiResult<Page<VideoSummary>> {
        let mut pipeline = Pipeline::over("videos", "v")
            .lookup(JoinKind::Left, "users", "o", "id", "v.owner_id")
            .match_eq("v.is_published", true);

        if let Some(query) = &search.query {
            pipeline = pipeline.match_contains("v.title", query);
        }
        if let Some(owner) = &search.owner {
            pipeline = pipeline.match_eq("v.owner_id", owner);
        }
        if let Some((field, direction)) = search.sort {
            pipeline = pipeline.sort(field.column(), direction);
        }

        let page = pipeline
            .project(VIDEO_FIELDS)
            .sort("v.rowid", Direction::Asc)
            .paginate::<VideoRow>(&self.db, pagination)
            .await?;

        Ok(page.map(VideoSummary::from))
    }

    /// Playlists owned by `owner`. Private ones are listed only for the owner.
    pub async fn user_playlists(
        &self,
        owner: &ObjectId,
        viewer: Option<&ObjectId>,
        pagination: Pagination,
    ) -> ApiResult<Page<PlaylistSummary>> {
        let mut pipeline = Pipeline::over("playlists", "p").match_eq("p.owner_id", owner);

        if !viewer.is_some_and(|viewer| is_owner(viewer, owner)) {
            pipeline = pipeline.match_eq("p.visibility", "Public");
        }

        pipeline
            .project(&[
                "p.id",
                "p.owner_id",
                "p.title",
                "p.description",
                "p.visibility",
                "p.created_at",
                "p.updated_at",
            ])
            .add_count("total_videos", "playlist_videos", "playlist_id", "p.id")
            .sort("p.rowid", Direction::Asc)
            .paginate::<PlaylistSummary>(&self.db, pagination)
            .await
    }

    /// Videos of a playlist in playlist order, duplicates included. Drafts
    /// are listed only for their owner.
    pub async fn playlist_videos(
        &self,
        playlist_id: &ObjectId,
        viewer: Option<&ObjectId>,
    ) -> ApiResult<Vec<VideoSummary>> {
        let rows = Pipeline::over("playlist_videos", "pv")
            .lookup(JoinKind::Inner, "videos", "v", "id", "pv.video_id")
            .lookup(JoinKind::Left, "users", "o", "id", "v.owner_id")
            .match_eq("pv.playlist_id", playlist_id)
            .match_either("v.is_published", true, "v.owner_id", viewer)
            .project(VIDEO_FIELDS)
            .sort("pv.position", Direction::Asc)
            .fetch_all::<VideoRow>(&self.db)
            .await?;

        Ok(rows.into_iter().map(VideoSummary::from).collect())
    }

    /// Videos liked by `user`, in the order they were liked. Videos
    /// unpublished since are hidden unless `user` owns them.
    pub async fn liked_videos(
        &self,
        user: &ObjectId,
        pagination: Pagination,
    ) -> ApiResult<Page<VideoSummary>> {
        let page = Pipeline::over("likes", "l")
            .lookup(JoinKind::Inner, "videos", "v", "id", "l.target_id")
            .lookup(JoinKind::Left, "users", "o", "id", "v.owner_id")
            .match_eq("l.liked_by", user)
            .match_eq("l.target_kind", LikeKind::Video.as_str())
            .match_either("v.is_published", true, "v.owner_id", user)
            .project(VIDEO_FIELDS)
            .sort("l.rowid", Direction::Asc)
            .paginate::<VideoRow>(&self.db, pagination)
            .await?;

        Ok(page.map(VideoSummary::from))
    }
}
