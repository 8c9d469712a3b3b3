/// HTTP server setup and routing
use crate::{
    config::CorsConfig,
    context::AppContext,
    error::{ApiError, ApiResult},
    media::MEDIA_ROUTE,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = cors_layer(&ctx.config.cors);
    let body_limit = DefaultBodyLimit::max(ctx.config.service.upload_limit);
    let media = ServeDir::new(&ctx.config.storage.media_directory);

    Router::new()
        .merge(crate::api::routes())
        .nest_service(MEDIA_ROUTE, media)
        .fallback(not_found)
        .with_state(ctx)
        .layer(body_limit)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Credentialed CORS cannot use a wildcard origin, so `*` mirrors the
/// request's origin instead.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.origin == "*" {
        AllowOrigin::mirror_request()
    } else {
        match HeaderValue::from_str(&config.origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin = %config.origin, "Invalid CORS origin, mirroring request origin");
                AllowOrigin::mirror_request()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// 404 handler
async fn not_found() -> impl IntoResponse {
    ApiError::NotFound("Endpoint not found".to_string())
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> ApiResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("VidTube listening on {}", addr);
    info!("   Public URL: {}", ctx.config.service.public_url);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
