/// Playlist endpoints
use crate::{
    api::PageQuery,
    auth::{AuthContext, OptionalAuthContext},
    content::{CreatePlaylistRequest, UpdatePlaylistRequest},
    context::AppContext,
    error::ApiResult,
    ids::ObjectId,
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/playlist", post(create_playlist))
        .route("/playlist/user/:user_id", get(user_playlists))
        .route(
            "/playlist/:playlist_id",
            get(get_playlist).patch(update_playlist).delete(delete_playlist),
        )
        .route("/playlist/add/:video_id/:playlist_id", patch(add_video))
        .route("/playlist/remove/:video_id/:playlist_id", patch(remove_video))
}

async fn create_playlist(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(request): Json<CreatePlaylistRequest>,
) -> ApiResult<impl IntoResponse> {
    let playlist = ctx.playlists.create(auth.user_id(), request).await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        json!({ "playlist": playlist }),
        "Playlist created successfully",
    ))
}

async fn user_playlists(
    State(ctx): State<AppContext>,
    viewer: OptionalAuthContext,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = ObjectId::parse(&user_id, "user")?;
    let playlists = ctx
        .playlists
        .list_for_user(&user_id, viewer.user_id(), page.pagination()?)
        .await?;

    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

async fn get_playlist(
    State(ctx): State<AppContext>,
    viewer: OptionalAuthContext,
    Path(playlist_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = ObjectId::parse(&playlist_id, "playlist")?;
    let playlist = ctx.playlists.get(&playlist_id, viewer.user_id()).await?;

    Ok(ApiResponse::ok(
        json!({ "playlist": playlist }),
        "Playlist fetched successfully",
    ))
}

async fn update_playlist(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(playlist_id): Path<String>,
    Json(request): Json<UpdatePlaylistRequest>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = ObjectId::parse(&playlist_id, "playlist")?;
    let playlist = ctx
        .playlists
        .update(auth.user_id(), &playlist_id, request)
        .await?;

    Ok(ApiResponse::ok(
        json!({ "playlist": playlist }),
        "Playlist updated successfully",
    ))
}

async fn delete_playlist(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(playlist_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let playlist_id = ObjectId::parse(&playlist_id, "playlist")?;
    ctx.playlists.delete(auth.user_id(), &playlist_id).await?;

    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

async fn add_video(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let playlist_id = ObjectId::parse(&playlist_id, "playlist")?;
    let playlist = ctx
        .playlists
        .add_video(auth.user_id(), &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok(
        json!({ "playlist": playlist }),
        "Video added to the playlist successfully",
    ))
}

async fn remove_video(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let video_id = ObjectId::parse(&video_id, "video")?;
    let playlist_id = ObjectId::parse(&playlist_id, "playlist")?;
    let playlist = ctx
        .playlists
        .remove_video(auth.user_id(), &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok(
        json!({ "playlist": playlist }),
        "Removed video from playlist successfully",
    ))
}
