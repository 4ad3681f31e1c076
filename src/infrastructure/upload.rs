//! Upload collaborator for media blocks (images, attachments).

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::infrastructure::traits::{FileSystem, Uploader};
use crate::infrastructure::{InfraError, InfraResult};

/// A file picked by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
}

/// Stored file description returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    /// Signed download url, when the endpoint hands out one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_url: Option<String>,
    /// Anything else the endpoint reports (name, size, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{success, file: {url, ...}}` as consumed by media blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: UploadedFile,
}

impl UploadResponse {
    /// Image blocks display through the download url.
    pub fn for_image(mut self) -> Self {
        if let Some(get_url) = &self.file.get_url {
            self.file.url = get_url.clone();
        }
        self
    }
}

/// Stores uploads in a local media directory served under `base_url`.
pub struct FsUploader {
    fs: Arc<dyn FileSystem>,
    media_dir: PathBuf,
    base_url: String,
}

impl FsUploader {
    pub fn new(fs: Arc<dyn FileSystem>, media_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            fs,
            media_dir,
            base_url: base_url.into(),
        }
    }
}

impl Uploader for FsUploader {
    #[instrument(level = "debug", skip(self))]
    fn upload(&self, request: &UploadRequest) -> InfraResult<UploadResponse> {
        let name = request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| InfraError::Upload {
                message: format!("not a file name: {}", request.path.display()),
            })?;
        if !self.fs.exists(&request.path) {
            return Err(InfraError::Upload {
                message: format!("file not found: {}", request.path.display()),
            });
        }

        let target = self.media_dir.join(name);
        self.fs
            .ensure_parent(&target)
            .map_err(|e| InfraError::io(format!("create {}", self.media_dir.display()), e))?;
        let size = self
            .fs
            .copy(&request.path, &target)
            .map_err(|e| InfraError::io(format!("copy to {}", target.display()), e))?;
        debug!("upload: stored {} ({} bytes)", target.display(), size);

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), name);
        let mut extra = Map::new();
        extra.insert("name".into(), Value::from(name));
        extra.insert("size".into(), Value::from(size));
        Ok(UploadResponse {
            success: true,
            file: UploadedFile {
                url: url.clone(),
                get_url: Some(url),
                extra,
            },
        })
    }
}
