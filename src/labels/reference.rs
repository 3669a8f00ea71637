use crate::core::error::ReferenceError;
use crate::models::label::{ImageRef, LabelEntry};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Bytes of a pesticide illustration plus the MIME type to serve it with
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Resolves a label's illustration from the assets directory or a remote URL
pub struct ReferenceImages {
    assets_dir: PathBuf,
    client: reqwest::Client,
}

impl ReferenceImages {
    pub fn new(assets_dir: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { assets_dir, client })
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub async fn fetch(&self, entry: &LabelEntry) -> Result<ReferenceImage, ReferenceError> {
        let result = match &entry.image {
            ImageRef::Local(relative) => self.read_local(relative).await,
            ImageRef::Remote(url) => self.fetch_remote(url).await,
        };

        if let Err(e) = &result {
            warn!(
                class_index = entry.index,
                image = %entry.image,
                error = %e,
                "Pesticide image unavailable"
            );
        }

        result
    }

    async fn read_local(&self, relative: &Path) -> Result<ReferenceImage, ReferenceError> {
        let path = self.assets_dir.join(relative);

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReferenceError::NotFound(path.display().to_string())
            } else {
                ReferenceError::FetchFailed(format!("{}: {}", path.display(), e))
            }
        })?;

        Ok(ReferenceImage {
            content_type: guess_mime(&path).to_string(),
            bytes,
        })
    }

    async fn fetch_remote(&self, url: &str) -> Result<ReferenceImage, ReferenceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReferenceError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReferenceError::FetchFailed(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime(Path::new(url)).to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReferenceError::FetchFailed(e.to_string()))?;

        Ok(ReferenceImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn guess_mime(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
