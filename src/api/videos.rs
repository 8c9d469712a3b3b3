/// Video endpoints
use crate::{
    aggregate::{Pagination, VideoSearch},
    api::upload::MultipartForm,
    auth::{AuthContext, OptionalAuthContext},
    content::{PublishVideoRequest, UpdateVideoRequest},
    context::AppContext,
    error::ApiResult,
    ids::ObjectId,
    response::ApiResponse,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/videos", get(search_videos).post(publish_video))
        .route(
            "/videos/:video_id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/videos/toggle/publish/:video_id", patch(toggle_publish))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    page: Option<String>,
    limit: Option<String>,
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

async fn search_videos(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref())?;
    let search = VideoSearch::from_params(
        params.query.as_deref(),
        params.user_id.as_deref(),
        params.sort_by.as_deref(),
        params.sort_type.as_deref(),
    )?;

    let videos = ctx.views.search_videos(&search, pagination).await?;

    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

/// Multipart: title, description, videoFile, thumbnail
async fn publish_video(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::parse(multipart, &ctx.config.storage.temp_directory).await?;
    let request = PublishVideoRequest {
        title: form.owned_text("title"),
        description: form.owned_text("description"),
    };

    let video = ctx
        .videos
        .publish(
            auth.user_id(),
            request,
            form.file("videoFile"),
            form.file("thumbnail"),
        )
        .await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        json!({ "video": video }),
        "Video published successfully",
    ))
}

async fn get_video(
    State(ctx): State<AppContext>,
    viewer: OptionalAuthContext,
    Path(video_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let video = ctx.videos.get(&video_id, viewer.user_id()).await?;

    Ok(ApiResponse::ok(
        json!({ "video": video }),
        "Video found successfully",
    ))
}

/// Multipart: title?, description?, thumbnail?
async fn update_video(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let form = MultipartForm::parse(multipart, &ctx.config.storage.temp_directory).await?;
    let request = UpdateVideoRequest {
        title: form.owned_text("title"),
        description: form.owned_text("description"),
    };

    let video = ctx
        .videos
        .update(auth.user_id(), &video_id, request, form.file("thumbnail"))
        .await?;

    Ok(ApiResponse::ok(
        json!({ "video": video }),
        "Video updated successfully",
    ))
}

async fn delete_video(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(video_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    ctx.videos.delete(auth.user_id(), &video_id).await?;

    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

async fn toggle_publish(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(video_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let video = ctx.videos.toggle_publish(auth.user_id(), &video_id).await?;

    Ok(ApiResponse::ok(
        json!({ "video": video }),
        "Publish status toggled successfully",
    ))
}
