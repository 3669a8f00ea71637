// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        // Account endpoints
        .route("/register", post(crate::handlers::auth::register_handler))
        .route("/login", post(crate::handlers::auth::login_handler))
        .route("/logout", post(crate::handlers::auth::logout_handler))
        .route("/session", get(crate::handlers::auth::session_handler))

        // Detector (requires session)
        .route("/detect", post(crate::handlers::detect::detect_handler))

        // Public lookups
        .route("/labels", get(crate::handlers::labels::labels_handler))
        .route("/reference/{index}", get(crate::handlers::labels::reference_handler))
        .route("/health", get(crate::handlers::health::health_handler))

        // Admin endpoints (require API key)
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
