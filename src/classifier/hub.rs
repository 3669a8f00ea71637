use crate::core::error::ClassifierError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Identifies one file inside a model hub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub repo_id: String,
    pub revision: String,
    pub filename: String,
}

impl ArtifactRef {
    pub fn new(repo_id: &str, revision: &str, filename: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            revision: revision.to_string(),
            filename: filename.to_string(),
        }
    }

    /// `<cache_dir>/<owner>--<repo>/<revision>/<filename>`
    pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir
            .join(self.repo_id.replace('/', "--"))
            .join(&self.revision)
            .join(&self.filename)
    }
}

/// Download-and-cache client for a Hugging Face style model hub
pub struct HubClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HubClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Fetch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn artifact_url(&self, artifact: &ArtifactRef) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, artifact.repo_id, artifact.revision, artifact.filename
        )
    }

    /// Return the local path of the artifact, downloading it first unless
    /// a cached copy exists. Partial downloads never land at the final path.
    pub async fn fetch(&self, artifact: &ArtifactRef, cache_dir: &Path) -> Result<PathBuf, ClassifierError> {
        let path = artifact.cache_path(cache_dir);
        if path.is_file() {
            debug!(path = %path.display(), "Model artifact found in cache");
            return Ok(path);
        }

        let url = self.artifact_url(artifact);
        info!(url = %url, "Downloading model artifact");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClassifierError::Fetch(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ClassifierError::Fetch(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClassifierError::Fetch(format!("{}: {}", parent.display(), e)))?;
        }

        let partial = path.with_extension("part");
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| ClassifierError::Fetch(format!("{}: {}", partial.display(), e)))?;

        let mut downloaded: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ClassifierError::Fetch(format!("{url}: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| ClassifierError::Fetch(format!("{}: {}", partial.display(), e)))?;
            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| ClassifierError::Fetch(format!("{}: {}", partial.display(), e)))?;
        drop(file);

        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| ClassifierError::Fetch(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            bytes = downloaded,
            "Model artifact cached"
        );

        Ok(path)
    }
}
