/// Like endpoints
use crate::{
    api::PageQuery,
    auth::AuthContext,
    content::LikeTarget,
    context::AppContext,
    error::ApiResult,
    ids::ObjectId,
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/likes/toggle/v/:video_id", post(toggle_video_like))
        .route("/likes/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/likes/toggle/t/:tweet_id", post(toggle_tweet_like))
        .route("/likes/videos", get(liked_videos))
}

async fn toggle(ctx: &AppContext, auth: &AuthContext, target: LikeTarget) -> ApiResult<impl IntoResponse> {
    let status = ctx.likes.toggle(auth.user_id(), target).await?;
    let message = if status.is_liked { "Liked" } else { "Like removed" };
    Ok(ApiResponse::ok(status, message))
}

async fn toggle_video_like(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(video_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target = LikeTarget::Video(ObjectId::parse(&video_id, "video")?);
    toggle(&ctx, &auth, target).await
}

async fn toggle_comment_like(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(comment_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target = LikeTarget::Comment(ObjectId::parse(&comment_id, "comment")?);
    toggle(&ctx, &auth, target).await
}

async fn toggle_tweet_like(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(tweet_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target = LikeTarget::Tweet(ObjectId::parse(&tweet_id, "tweet")?);
    toggle(&ctx, &auth, target).await
}

async fn liked_videos(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let videos = ctx
        .likes
        .liked_videos(auth.user_id(), page.pagination()?)
        .await?;

    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
