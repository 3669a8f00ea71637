// Centralized error handling for the detector

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::api::{ErrorResponse, WarningResponse};

/// Errors raised while reading or rewriting the credential file
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to access credential file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is not a JSON object of strings: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from fetching, deserializing or running the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to fetch model artifact: {0}")]
    Fetch(String),

    #[error("Failed to deserialize model artifact: {0}")]
    Deserialize(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model produced an empty confidence vector")]
    EmptyOutput,

    #[error("Input tensor has {actual} values, expected {expected}")]
    InputShape { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate class index {0} in label table")]
    DuplicateIndex(usize),
}

/// Errors on the login / register / logout surface
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists.")]
    UsernameTaken,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not logged in")]
    MissingSession,

    #[error("Credential store unavailable")]
    Store(#[from] CredentialError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UsernameTaken => StatusCode::CONFLICT,
            AuthError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AuthError::MissingSession => StatusCode::UNAUTHORIZED,
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Credential store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        error_json(status, self.to_string())
    }
}

/// Errors on the detection surface
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Not logged in")]
    Unauthorized,

    #[error("Missing multipart field 'image'")]
    MissingImage,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Pest classifier unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<PipelineError> for DetectError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidImage(msg) => DetectError::InvalidImage(msg),
            PipelineError::Classifier(e) => DetectError::Inference(e.to_string()),
        }
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = match &self {
            DetectError::Unauthorized => StatusCode::UNAUTHORIZED,
            DetectError::MissingImage => StatusCode::BAD_REQUEST,
            DetectError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            DetectError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DetectError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DetectError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error_json(status, self.to_string())
    }
}

/// Reference image problems are warnings: the textual recommendation
/// has already been delivered by the time a client asks for the picture.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("No label entry for class {0}")]
    UnknownClass(usize),

    #[error("Pesticide image not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch pesticide image: {0}")]
    FetchFailed(String),
}

impl IntoResponse for ReferenceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReferenceError::UnknownClass(_) => StatusCode::NOT_FOUND,
            ReferenceError::NotFound(_) => StatusCode::NOT_FOUND,
            ReferenceError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
        };

        (
            status,
            Json(WarningResponse {
                success: false,
                warning: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        (status, message).into_response()
    }
}

fn error_json(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
        }),
    )
        .into_response()
}
