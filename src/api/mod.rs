/// API routes and handlers
pub mod comments;
pub mod health;
pub mod likes;
pub mod middleware;
pub mod playlists;
pub mod subscriptions;
pub mod upload;
pub mod users;
pub mod videos;

use crate::{aggregate::Pagination, context::AppContext, error::ApiResult};
use axum::Router;
use serde::Deserialize;

/// Prefix every versioned route is nested under
pub const API_PREFIX: &str = "/api/v1";

/// Build API routes
pub fn routes() -> Router<AppContext> {
    let v1 = Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(videos::routes())
        .merge(comments::routes())
        .merge(playlists::routes())
        .merge(likes::routes())
        .merge(subscriptions::routes());

    Router::new().nest(API_PREFIX, v1)
}

/// `?page=&limit=` query, validated into a [`Pagination`]
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self) -> ApiResult<Pagination> {
        Pagination::parse(self.page.as_deref(), self.limit.as_deref())
    }
}
