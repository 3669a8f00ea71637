use crate::core::error::{DetectError, PipelineError};
use crate::core::state::AppState;
use crate::models::api::DetectResponse;
use crate::models::prediction::PredictionResult;
use crate::pipeline::predict::PredictionPipeline;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const IMAGE_FIELD: &str = "image";

/// Classify an uploaded pest photo
///
/// POST /detect, multipart form with an `image` field (jpg, jpeg or png).
/// Requires a logged-in session.
pub async fn detect_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, DetectError> {
    let session = state
        .session_from_headers(&headers)
        .ok_or(DetectError::Unauthorized)?;

    let image = read_image_field(&mut multipart).await?;
    debug!(username = %session.username, bytes = image.len(), "Image uploaded");

    let classifier = state.classifier.load().await.map_err(|e| {
        error!(error = %e, "Pest classifier could not be loaded");
        DetectError::ModelUnavailable(e.to_string())
    })?;

    let pipeline = PredictionPipeline::new(
        classifier,
        Arc::clone(&state.labels),
        state.config.model.input_size,
    );

    let outcome = tokio::task::spawn_blocking(move || pipeline.predict(&image))
        .await
        .map_err(|e| DetectError::InternalError(e.to_string()))?;

    let prediction = match outcome {
        Ok(prediction) => prediction,
        Err(PipelineError::InvalidImage(msg)) => {
            state.metrics.increment_invalid_images();
            warn!(username = %session.username, error = %msg, "Rejected undecodable upload");
            return Err(DetectError::InvalidImage(msg));
        }
        Err(e) => {
            error!(username = %session.username, error = %e, "Inference failed");
            return Err(e.into());
        }
    };

    state.metrics.record_prediction(prediction.is_recognized());
    info!(
        username = %session.username,
        class_index = prediction.class_index,
        confidence = prediction.confidence(),
        recognized = prediction.is_recognized(),
        "Prediction served"
    );

    Ok((StatusCode::OK, Json(to_response(prediction))).into_response())
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, DetectError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some(IMAGE_FIELD) {
            return field.bytes().await.map_err(upload_error);
        }
    }

    Err(DetectError::MissingImage)
}

/// The body limit surfaces as a multipart error; keep it apart from bad images
fn upload_error(err: MultipartError) -> DetectError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %err.body_text(), "Rejected oversized upload");
        DetectError::PayloadTooLarge(err.body_text())
    } else {
        DetectError::InvalidImage(err.body_text())
    }
}

fn to_response(prediction: PredictionResult) -> DetectResponse {
    let confidence = prediction.confidence();

    match prediction.label {
        Some(label) => DetectResponse {
            success: true,
            detected: true,
            class_index: prediction.class_index,
            confidence,
            message: format!(
                "Detected pest: {}. Recommended pesticide: {}.",
                label.pest, label.pesticide
            ),
            pest: Some(label.pest),
            pesticide: Some(label.pesticide),
            reference_image: Some(format!("/reference/{}", prediction.class_index)),
            confidences: prediction.confidences,
        },
        None => DetectResponse {
            success: true,
            detected: false,
            class_index: prediction.class_index,
            confidence,
            confidences: prediction.confidences,
            pest: None,
            pesticide: None,
            reference_image: None,
            message: "Pest not recognized.".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::loader::ClassifierLoader;
    use crate::core::routes::build_router;
    use crate::test_support::{create_test_config, create_test_state, encode_png, FixedScores, MeanIntensity};
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::Router;
    use http_body_util::BodyExt;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pestdetectorboundary";

    fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"leaf.png\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn detect_request(token: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/detect")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: Response) -> DetectResponse {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn black_png() -> Vec<u8> {
        encode_png(&RgbImage::new(64, 64))
    }

    fn router_with(state: Arc<AppState>) -> Router {
        build_router(state)
    }

    // Pseudo-random pixels so the PNG encoder cannot shrink it
    fn noisy_png(size: u32) -> Vec<u8> {
        let mut seed: u32 = 0x2545_f491;
        let img = RgbImage::from_fn(size, size, |_, _| {
            let mut next = || {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (seed >> 16) as u8
            };
            Rgb([next(), next(), next()])
        });
        encode_png(&img)
    }

    #[tokio::test]
    async fn test_detect_black_image_is_first_class() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(dir.path(), Arc::new(MeanIntensity { classes: 9 }));
        let session = state.sessions.create("alice");

        let response = router_with(state.clone())
            .oneshot(detect_request(Some(&session.token), multipart_body("image", &black_png())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body.detected);
        assert_eq!(body.class_index, 0);
        assert_eq!(body.pest.as_deref(), Some("Aphid"));
        assert_eq!(body.pesticide.as_deref(), Some("Pyrethroids"));
        assert_eq!(body.reference_image.as_deref(), Some("/reference/0"));
        assert_eq!(body.confidences.len(), 9);
        assert_eq!(state.metrics.predictions.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_detect_unknown_class_is_not_recognized() {
        let dir = TempDir::new().unwrap();
        let mut scores = vec![0.0; 12];
        scores[11] = 1.0;
        let state = create_test_state(dir.path(), Arc::new(FixedScores(scores)));
        let session = state.sessions.create("alice");

        let response = router_with(state.clone())
            .oneshot(detect_request(Some(&session.token), multipart_body("image", &black_png())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(!body.detected);
        assert_eq!(body.class_index, 11);
        assert_eq!(body.message, "Pest not recognized.");
        assert!(body.pest.is_none());
        assert!(body.reference_image.is_none());
        assert_eq!(state.metrics.unrecognized_predictions.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_detect_requires_session() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(dir.path(), Arc::new(FixedScores(vec![1.0; 9])));

        let response = router_with(state)
            .oneshot(detect_request(None, multipart_body("image", &black_png())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_detect_rejects_non_image() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(dir.path(), Arc::new(FixedScores(vec![1.0; 9])));
        let session = state.sessions.create("alice");

        let response = router_with(state.clone())
            .oneshot(detect_request(
                Some(&session.token),
                multipart_body("image", b"definitely not a png"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.metrics.invalid_images.load(Ordering::Relaxed), 1);
        assert_eq!(state.metrics.predictions.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_detect_missing_field() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(dir.path(), Arc::new(FixedScores(vec![1.0; 9])));
        let session = state.sessions.create("alice");

        let response = router_with(state)
            .oneshot(detect_request(Some(&session.token), multipart_body("photo", &black_png())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_detect_model_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(dir.path());
        config.model.local_path = Some(dir.path().join("missing.onnx"));
        let loader = ClassifierLoader::new(config.model.clone());
        let state = Arc::new(
            AppState::new(config, loader, crate::labels::table::LabelTable::builtin()).unwrap(),
        );
        let session = state.sessions.create("alice");

        let response = router_with(state)
            .oneshot(detect_request(Some(&session.token), multipart_body("image", &black_png())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_to_response_uses_winning_score() {
        let prediction = PredictionResult {
            class_index: 2,
            confidences: vec![0.1, 0.2, 0.7],
            label: crate::labels::table::LabelTable::builtin().resolve(2).cloned(),
        };

        let response = to_response(prediction);
        assert!(response.detected);
        assert!((response.confidence - 0.7).abs() < f32::EPSILON);
        assert_eq!(response.reference_image.as_deref(), Some("/reference/2"));
    }

    #[tokio::test]
    async fn test_detect_oversized_upload_is_413() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(dir.path());
        config.server.max_upload_bytes = 1024;
        let loader = ClassifierLoader::with_classifier(
            config.model.clone(),
            Arc::new(FixedScores(vec![1.0; 9])),
        );
        let state = Arc::new(
            AppState::new(config, loader, crate::labels::table::LabelTable::builtin()).unwrap(),
        );
        let session = state.sessions.create("alice");

        let png = noisy_png(200);
        assert!(png.len() > 1024);

        let response = router_with(state.clone())
            .oneshot(detect_request(Some(&session.token), multipart_body("image", &png)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.metrics.invalid_images.load(Ordering::Relaxed), 0);
        assert_eq!(state.metrics.predictions.load(Ordering::Relaxed), 0);
    }
}
