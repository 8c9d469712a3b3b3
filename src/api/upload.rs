/// Multipart form handling
///
/// File parts are streamed into `NamedTempFile`s in the configured temp
/// directory and removed when the form is dropped, whether or not the media
/// store accepted them.
use crate::error::{ApiError, ApiResult};
use axum::extract::{multipart::Field, Multipart};
use std::collections::HashMap;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

#[derive(Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, NamedTempFile>,
}

impl MultipartForm {
    /// Read every part; text parts are kept in memory, file parts are staged
    pub async fn parse(mut multipart: Multipart, temp_dir: &Path) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) if !file_name.is_empty() => {
                    if let Some(staged) = stage_file(field, &file_name, temp_dir).await? {
                        form.files.insert(name, staged);
                    }
                }
                // Browsers send an empty, nameless part for an unset file input
                Some(_) => {}
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::InvalidInput(format!("Unreadable form field {}: {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn owned_text(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Path of a staged file part, valid while the form is alive
    pub fn file(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(NamedTempFile::path)
    }
}

async fn stage_file(
    mut field: Field<'_>,
    file_name: &str,
    temp_dir: &Path,
) -> ApiResult<Option<NamedTempFile>> {
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(temp_dir)?;
    let mut file = tokio::fs::File::from_std(staged.reopen()?);

    let mut written = 0usize;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Failed to read {}: {}", file_name, e)))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    if written == 0 {
        return Ok(None);
    }

    tracing::debug!(file = %file_name, bytes = written, "Staged upload");

    Ok(Some(staged))
}
