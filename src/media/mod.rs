/// Media storage collaborator
///
/// Receives staged upload files (avatars, cover images, videos, thumbnails)
/// and returns the public URL they are served from. The core only depends on
/// the [`MediaStore`] trait; any failure surfaces as `UploadFailed`.

pub mod disk;

pub use disk::{DiskMediaStore, MEDIA_ROUTE};

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    /// Playback length in seconds, when the backend can determine it
    pub duration: Option<f64>,
}

/// Media storage backend trait
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the file at `local_path` and return where it is served from
    async fn upload(&self, local_path: &Path) -> ApiResult<UploadedMedia>;

    /// Remove previously uploaded media by URL. Unknown URLs are ignored.
    async fn delete(&self, url: &str) -> ApiResult<()>;
}
