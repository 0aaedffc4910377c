use crate::client::{ApiResponse, Client, RequestOptions};
use crate::error::{ensure, Result};
use crate::models::{MediaType, UploadedMedia};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

pub struct MediaApi<'a> {
    client: &'a Client,
}

impl<'a> MediaApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `media/upload` of a local file
    pub async fn upload(&self, media_type: MediaType, file_path: &Path) -> Result<UploadedMedia> {
        self.client
            .upload(
                "media/upload",
                &json!({ "type": media_type.as_str() }),
                "media",
                file_path,
                &[],
                &RequestOptions::default(),
            )
            .await?
            .json()
    }

    /// Download location of a media file
    ///
    /// `media/get` answers with a redirect; a missing media id yields a 200 with
    /// an empty body, reported as `None`.
    pub async fn get(&self, media_id: &str) -> Result<Option<String>> {
        ensure(!media_id.is_empty(), "media id required")?;
        let response = self
            .client
            .get("media/get", &json!({ "media_id": media_id }), &RequestOptions::default())
            .await?;

        match response {
            ApiResponse::Raw(raw) if raw.is_redirect() => Ok(raw.location().map(str::to_string)),
            _ => Ok(None),
        }
    }

    /// Save a media file into `target_dir`, which must exist
    ///
    /// The file is named `file_name`, or after the last segment of the download URL.
    pub async fn download(
        &self,
        media_id: &str,
        target_dir: &Path,
        file_name: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let Some(location) = self.get(media_id).await? else {
            return Ok(None);
        };

        let name = match file_name {
            Some(name) => name.to_string(),
            None => url::Url::parse(&location)?
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| media_id.to_string()),
        };

        let file_path = target_dir.join(name);
        self.client
            .download(&location, &file_path, DOWNLOAD_TIMEOUT)
            .await?;
        Ok(Some(file_path))
    }
}
