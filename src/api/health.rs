/// Health check endpoint
///
/// Answers once the database can serve a trivial query. A failing check
/// surfaces as the usual 500 error envelope.
use crate::{context::AppContext, db, error::ApiResult, response::ApiResponse};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde_json::json;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/healthcheck", get(healthcheck))
}

async fn healthcheck(State(ctx): State<AppContext>) -> ApiResult<impl IntoResponse> {
    db::test_connection(&ctx.db).await.map_err(|e| {
        tracing::warn!(error = %e, "healthcheck_failed: database check failed");
        e
    })?;

    Ok(ApiResponse::ok(json!({}), "Everything is working well"))
}
