//! Shared fixtures for unit tests: stub classifiers, encoded images,
//! a throwaway HTTP server and a ready-made application state.

use crate::classifier::loader::ClassifierLoader;
use crate::classifier::{Classifier, ImageTensor};
use crate::core::config::{
    AdminConfig, Config, CredentialsConfig, LabelsConfig, LoggingConfig, ModelConfig, ServerConfig,
};
use crate::core::error::ClassifierError;
use crate::core::state::AppState;
use crate::labels::table::LabelTable;
use axum::Router;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "test-api-key";

/// Returns the same scores for every input
pub struct FixedScores(pub Vec<f32>);

impl Classifier for FixedScores {
    fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.0.clone())
    }
}

/// Scores each class by how close the image's mean intensity is to
/// `index / (classes - 1)`: black maps to class 0, white to the last.
pub struct MeanIntensity {
    pub classes: usize,
}

impl Classifier for MeanIntensity {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        if input.data.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        let mean = input.data.iter().sum::<f32>() / input.data.len() as f32;
        let step = 1.0 / (self.classes.max(2) - 1) as f32;

        Ok((0..self.classes)
            .map(|i| 1.0 - (mean - i as f32 * step).abs())
            .collect())
    }
}

/// Fails unless handed a `[1, size, size, 3]` tensor
pub struct ShapeCheck {
    pub size: usize,
}

impl Classifier for ShapeCheck {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let expected = self.size * self.size * 3;
        if input.shape != [1, self.size, self.size, 3] || input.data.len() != expected {
            return Err(ClassifierError::InputShape {
                expected,
                actual: input.data.len(),
            });
        }
        Ok(vec![1.0; 9])
    }
}

pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Serve `router` on an ephemeral localhost port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{}", addr)
}

pub fn create_test_config(dir: &Path) -> Config {
    Config {
        server: ServerConfig {
            port: Some(8080),
            unix_socket: None,
            num_threads: 2,
            max_upload_bytes: 10 * 1024 * 1024,
        },
        credentials: CredentialsConfig {
            path: dir.join("users.json"),
        },
        model: ModelConfig {
            hub_endpoint: "http://127.0.0.1:9".to_string(),
            cache_dir: dir.join("model-cache"),
            ..ModelConfig::default()
        },
        labels: LabelsConfig {
            assets_dir: dir.join("assets"),
            path: None,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            console: true,
        },
        admin: AdminConfig {
            api_key: Some(TEST_API_KEY.to_string()),
        },
    }
}

/// State whose classifier is already loaded with `classifier`
pub fn create_test_state(dir: &Path, classifier: Arc<dyn Classifier>) -> Arc<AppState> {
    let config = create_test_config(dir);
    let loader = ClassifierLoader::with_classifier(config.model.clone(), classifier);

    Arc::new(AppState::new(config, loader, LabelTable::builtin()).expect("test state"))
}
