/// Resource managers for videos, comments, playlists, likes and subscriptions
///
/// Every mutation follows the same order: validate input, load the target
/// (`NotFound`), check ownership (`Forbidden`), write, return the new state.
mod comment;
mod like;
mod playlist;
mod subscription;
mod video;

pub use comment::CommentManager;
pub use like::{LikeManager, LikeStatus, LikeTarget};
pub use playlist::{PlaylistDetail, PlaylistManager};
pub use subscription::{SubscriptionManager, SubscriptionStatus};
pub use video::VideoManager;

use crate::db::models::Visibility;
use serde::{Deserialize, Serialize};

/// Text fields of a video upload (files travel separately)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Blank or absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Blank or absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}
