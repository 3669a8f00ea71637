use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use crate::models::api::ErrorResponse;

const VALID_ENDPOINTS: &str =
    "/register, /login, /logout, /session, /detect, /labels, /reference/{index}, /health";

pub async fn fallback_handler(headers: HeaderMap) -> Response {
    // Check if this is a browser request
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let is_browser = user_agent.contains("Mozilla")
        || user_agent.contains("Chrome")
        || user_agent.contains("Safari")
        || user_agent.contains("Firefox")
        || user_agent.contains("Edge");

    if is_browser {
        return (StatusCode::NOT_FOUND, Html("Nothing to see here. No pests either.")).into_response();
    }

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            success: false,
            error: format!("Invalid endpoint. Valid endpoints: {}", VALID_ENDPOINTS),
        }),
    )
        .into_response()
}
