/// Disk-based media storage backend
use crate::{
    error::{ApiError, ApiResult},
    ids::ObjectId,
    media::{MediaStore, UploadedMedia},
};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// URL path segment media is served under
pub const MEDIA_ROUTE: &str = "/media";

/// Disk storage backend
///
/// Copies staged uploads into `base_path` with directory sharding on the
/// first two characters of the generated file name, and builds URLs under
/// `{public_url}/media/`.
#[derive(Clone)]
pub struct DiskMediaStore {
    base_path: PathBuf,
    public_url: String,
}

impl DiskMediaStore {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf, public_url: impl Into<String>) -> Self {
        Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}{}/", self.public_url, MEDIA_ROUTE)
    }

    /// Relative path `{shard}/{name}` for a newly stored file
    fn relative_path_for(local_path: &Path) -> PathBuf {
        let mut name = ObjectId::new().to_string();
        if let Some(ext) = local_path.extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(&ext.to_ascii_lowercase());
        }
        PathBuf::from(&name[0..2]).join(name)
    }

    /// Map a URL produced by this store back to a file path
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(&self.url_prefix())?);
        // Only plain segments, never `..` or absolute paths
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.base_path.join(relative))
        } else {
            None
        }
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn upload(&self, local_path: &Path) -> ApiResult<UploadedMedia> {
        let metadata = fs::metadata(local_path).await.map_err(|e| {
            ApiError::UploadFailed(format!("Cannot read {}: {}", local_path.display(), e))
        })?;

        if metadata.len() == 0 {
            return Err(ApiError::UploadFailed("Uploaded file is empty".to_string()));
        }

        let relative = Self::relative_path_for(local_path);
        let destination = self.base_path.join(&relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::UploadFailed(format!("Failed to create media directory: {}", e))
            })?;
        }

        fs::copy(local_path, &destination).await.map_err(|e| {
            ApiError::UploadFailed(format!("Failed to store media: {}", e))
        })?;

        let url = format!(
            "{}{}",
            self.url_prefix(),
            relative.to_string_lossy().replace('\\', "/")
        );
        tracing::debug!(url = %url, bytes = metadata.len(), "Stored media");

        Ok(UploadedMedia {
            url,
            duration: None,
        })
    }

    async fn delete(&self, url: &str) -> ApiResult<()> {
        let Some(path) = self.path_for_url(url) else {
            tracing::debug!(url = %url, "Ignoring delete for foreign media URL");
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Internal(format!(
                "Failed to delete media {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
