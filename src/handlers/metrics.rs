// Metrics endpoint

use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::models::api::ApiKeyQuery;
use crate::utils::auth::constant_time_eq;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Returns JSON with the detector's counters:
/// - registrations, successful and failed logins
/// - predictions served, unrecognized predictions, rejected uploads
/// - active sessions, whether the classifier is loaded, uptime
///
/// Requires the configured admin API key. With no key configured the
/// endpoint always answers 401.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, MonitoringError> {
    let authorized = state
        .config
        .admin
        .api_key
        .as_deref()
        .is_some_and(|expected| constant_time_eq(&params.api_key, expected));

    if !authorized {
        warn!("Unauthorized metrics access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    let snapshot = state
        .metrics
        .get_snapshot(&state.sessions, state.classifier.is_loaded());

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collector::MetricsSnapshot;
    use crate::test_support::{create_test_state, FixedScores, TEST_API_KEY};
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn create_state(dir: &TempDir) -> Arc<AppState> {
        create_test_state(dir.path(), Arc::new(FixedScores(vec![1.0; 9])))
    }

    fn query(key: &str) -> Query<ApiKeyQuery> {
        Query(ApiKeyQuery {
            api_key: key.to_string(),
        })
    }

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let dir = TempDir::new().unwrap();
        let state = create_state(&dir);

        let response = metrics_handler(State(state), query(TEST_API_KEY)).await.unwrap();

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);

        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        let snapshot: MetricsSnapshot = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(snapshot.predictions, 0);
        assert_eq!(snapshot.active_sessions, 0);
        assert!(snapshot.model_loaded);
        assert!(snapshot.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn test_metrics_handler_invalid_api_key() {
        let dir = TempDir::new().unwrap();
        let state = create_state(&dir);

        let result = metrics_handler(State(state), query("wrong-key")).await;
        assert!(result.is_err());
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_metrics_handler_without_configured_key() {
        let dir = TempDir::new().unwrap();
        let mut config = crate::test_support::create_test_config(dir.path());
        config.admin.api_key = None;
        let loader = crate::classifier::loader::ClassifierLoader::new(config.model.clone());
        let state = Arc::new(
            AppState::new(config, loader, crate::labels::table::LabelTable::builtin()).unwrap(),
        );

        let result = metrics_handler(State(state), query("")).await;
        assert!(matches!(result, Err(MonitoringError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_metrics_handler_with_data() {
        let dir = TempDir::new().unwrap();
        let state = create_state(&dir);

        state.metrics.increment_registrations();
        state.metrics.record_prediction(false);
        state.sessions.create("alice");

        let response = metrics_handler(State(state), query(TEST_API_KEY)).await.unwrap();

        let (_, body) = response.into_parts();
        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        let snapshot: MetricsSnapshot = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(snapshot.registrations, 1);
        assert_eq!(snapshot.predictions, 1);
        assert_eq!(snapshot.unrecognized_predictions, 1);
        assert_eq!(snapshot.active_sessions, 1);
    }
}
