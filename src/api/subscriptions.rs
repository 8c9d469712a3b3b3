/// Subscription endpoints
use crate::{
    auth::AuthContext, context::AppContext, error::ApiResult, ids::ObjectId,
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/subscriptions/c/:channel_id", post(toggle_subscription))
}

async fn toggle_subscription(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(channel_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = ObjectId::parse(&channel_id, "channel")?;
    let status = ctx
        .subscriptions
        .toggle(auth.user_id(), &channel_id)
        .await?;

    let message = if status.is_subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(status, message))
}
