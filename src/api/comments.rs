/// Comment endpoints
use crate::{
    api::PageQuery,
    auth::{AuthContext, OptionalAuthContext},
    content::CommentRequest,
    context::AppContext,
    error::ApiResult,
    ids::ObjectId,
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/comments/:video_id", get(video_comments).post(add_comment))
        .route(
            "/comments/c/:comment_id",
            patch(update_comment).delete(delete_comment),
        )
}

async fn video_comments(
    State(ctx): State<AppContext>,
    viewer: OptionalAuthContext,
    Path(video_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let comments = ctx
        .views
        .video_comments(&video_id, viewer.user_id(), page.pagination()?)
        .await?;

    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

async fn add_comment(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(video_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let comment = ctx.comments.add(auth.user_id(), &video_id, request).await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        json!({ "comment": comment }),
        "Comment added successfully",
    ))
}

async fn update_comment(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(comment_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = ObjectId::parse(&comment_id, "comment")?;
    let comment = ctx
        .comments
        .update(auth.user_id(), &comment_id, request)
        .await?;

    Ok(ApiResponse::ok(
        json!({ "comment": comment }),
        "Comment updated successfully",
    ))
}

async fn delete_comment(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(comment_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = ObjectId::parse(&comment_id, "comment")?;
    ctx.comments.delete(auth.user_id(), &comment_id).await?;

    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
