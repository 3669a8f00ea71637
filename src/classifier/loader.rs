use crate::classifier::hub::{ArtifactRef, HubClient};
use crate::classifier::onnx::OnnxClassifier;
use crate::classifier::Classifier;
use crate::core::config::ModelConfig;
use crate::core::error::ClassifierError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::info;

/// Owns the classifier handle for the process lifetime.
///
/// The first successful `load` fetches and deserializes the artifact;
/// every later call returns the same handle. A failed attempt leaves the
/// cell empty.
pub struct ClassifierLoader {
    config: ModelConfig,
    cell: OnceCell<Arc<dyn Classifier>>,
}

impl ClassifierLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// A loader that already holds a classifier and never touches the hub
    pub fn with_classifier(config: ModelConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            config,
            cell: OnceCell::new_with(Some(classifier)),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn load(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        self.cell
            .get_or_try_init(|| self.fetch_and_build())
            .await
            .map(Arc::clone)
    }

    async fn resolve_artifact(&self) -> Result<PathBuf, ClassifierError> {
        if let Some(local) = &self.config.local_path {
            if !local.is_file() {
                return Err(ClassifierError::Fetch(format!(
                    "local model {} does not exist",
                    local.display()
                )));
            }
            info!(path = %local.display(), "Using local model artifact");
            return Ok(local.clone());
        }

        let hub = HubClient::new(
            &self.config.hub_endpoint,
            Duration::from_secs(self.config.download_timeout_secs),
        )?;
        let artifact = ArtifactRef::new(&self.config.repo_id, &self.config.revision, &self.config.filename);

        hub.fetch(&artifact, &self.config.cache_dir).await
    }

    async fn fetch_and_build(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        let path = self.resolve_artifact().await?;
        let input_size = self.config.input_size;
        let layout = self.config.layout;

        let started = Instant::now();
        let model_path = path.clone();
        let classifier = tokio::task::spawn_blocking(move || {
            OnnxClassifier::load(&model_path, input_size, layout)
        })
        .await
        .map_err(|e| ClassifierError::Deserialize(format!("model loading task failed: {e}")))??;

        info!(
            path = %path.display(),
            input_size = input_size,
            layout = ?layout,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pest classifier loaded"
        );

        Ok(Arc::new(classifier))
    }
}
