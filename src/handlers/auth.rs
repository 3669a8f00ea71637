use crate::core::error::AuthError;
use crate::core::state::AppState;
use crate::models::api::{CredentialsRequest, LoginResponse, SessionResponse, SuccessResponse};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Register a new user
///
/// POST /register {"username": "...", "password": "..."}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Response, AuthError> {
    if body.username.is_empty() {
        return Err(AuthError::InvalidParameter("username must not be empty".to_string()));
    }

    if !state.credentials.register(&body.username, &body.password)? {
        warn!(username = %body.username, "Registration rejected, username taken");
        return Err(AuthError::UsernameTaken);
    }

    state.metrics.increment_registrations();
    info!(username = %body.username, "User registered");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "User registered! You can now log in.".to_string(),
        }),
    )
        .into_response())
}

/// Check credentials and open a session
///
/// POST /login {"username": "...", "password": "..."}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Response, AuthError> {
    let authenticated = state.credentials.authenticate(&body.username, &body.password)?;
    state.metrics.record_login(authenticated);

    if !authenticated {
        warn!(username = %body.username, "Login failed");
        return Err(AuthError::InvalidCredentials);
    }

    let session = state.sessions.create(&body.username);
    info!(username = %session.username, "User logged in");

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token: session.token.clone(),
            username: session.username.clone(),
            message: format!("Welcome back, {}!", session.username),
        }),
    )
        .into_response())
}

/// End the caller's session
///
/// POST /logout (Authorization: Bearer <token>)
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = state
        .session_from_headers(&headers)
        .ok_or(AuthError::MissingSession)?;

    state.sessions.remove(&session.token);
    info!(username = %session.username, "User logged out");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

/// Who is logged in on this token
///
/// GET /session (Authorization: Bearer <token>)
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = state
        .session_from_headers(&headers)
        .ok_or(AuthError::MissingSession)?;

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            username: session.username.clone(),
            created_at: session.created_at,
        }),
    )
        .into_response())
}
