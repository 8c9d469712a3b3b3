/// Account endpoints: registration, sessions, profile and channel views
use crate::{
    account::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
        UpdateAccountRequest,
    },
    api::{
        middleware::{extract_refresh_cookie, with_session_cookies, without_session_cookies},
        upload::MultipartForm,
    },
    auth::{AuthContext, OptionalAuthContext},
    context::AppContext,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/refresh-token", post(refresh_token))
        .route("/users/change-password", post(change_password))
        .route("/users/current-user", get(current_user))
        .route("/users/update-account", patch(update_account))
        .route("/users/avatar", patch(update_avatar))
        .route("/users/cover-image", patch(update_cover_image))
        .route("/users/c/:username", get(channel_profile))
        .route("/users/history", get(watch_history))
}

/// Multipart: username, email, fullName, password, avatar, coverImage?
async fn register(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::parse(multipart, &ctx.config.storage.temp_directory).await?;

    let request = RegisterRequest {
        username: form.owned_text("username").unwrap_or_default(),
        email: form.owned_text("email").unwrap_or_default(),
        full_name: form.owned_text("fullName").unwrap_or_default(),
        password: form.owned_text("password").unwrap_or_default(),
    };

    let user = ctx
        .accounts
        .register(request, form.file("avatar"), form.file("coverImage"))
        .await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        user,
        "User registered successfully",
    ))
}

async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (user, tokens) = ctx.accounts.login(request).await?;
    let jar = with_session_cookies(jar, &tokens, &ctx.config.authentication);

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    ctx.accounts.logout(auth.user_id()).await?;

    Ok((
        without_session_cookies(jar),
        ApiResponse::ok(json!({}), "User logged out"),
    ))
}

/// The `refreshToken` cookie wins over the JSON body
async fn refresh_token(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = extract_refresh_cookie(&jar)
        .or_else(|| body.and_then(|Json(request)| request.refresh_token));

    let tokens = ctx.tokens.rotate(presented.as_deref()).await?;
    let jar = with_session_cookies(jar, &tokens, &ctx.config.authentication);

    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

async fn change_password(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    ctx.accounts
        .change_password(auth.user_id(), &request.old_password, &request.new_password)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

async fn current_user(auth: AuthContext) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::ok(
        json!({ "user": auth.user }),
        "Current user fetched successfully",
    ))
}

async fn update_account(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = ctx
        .accounts
        .update_account_details(
            auth.user_id(),
            request.full_name.as_deref(),
            request.email.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(
        json!({ "user": user }),
        "Account details updated successfully",
    ))
}

async fn update_avatar(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::parse(multipart, &ctx.config.storage.temp_directory).await?;
    let file = form
        .file("avatar")
        .ok_or_else(|| ApiError::InvalidInput("Avatar file is missing".to_string()))?;

    let user = ctx.accounts.update_avatar(auth.user_id(), file).await?;

    Ok(ApiResponse::ok(
        json!({ "user": user }),
        "Avatar updated successfully",
    ))
}

async fn update_cover_image(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::parse(multipart, &ctx.config.storage.temp_directory).await?;
    let file = form
        .file("coverImage")
        .ok_or_else(|| ApiError::InvalidInput("Cover image file is missing".to_string()))?;

    let user = ctx.accounts.update_cover_image(auth.user_id(), file).await?;

    Ok(ApiResponse::ok(
        json!({ "user": user }),
        "Cover image updated successfully",
    ))
}

async fn channel_profile(
    State(ctx): State<AppContext>,
    viewer: OptionalAuthContext,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let channel = ctx
        .views
        .channel_profile(&username, viewer.user_id())
        .await?;

    Ok(ApiResponse::ok(channel, "User channel fetched successfully"))
}

async fn watch_history(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<impl IntoResponse> {
    let history = ctx.views.watch_history(auth.user_id()).await?;

    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}
