use serde::{Deserialize, Serialize};

/// Body of POST /register and POST /login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WarningResponse {
    pub success: bool,
    pub warning: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    /// False when the predicted class has no label entry
    pub detected: bool,
    pub class_index: usize,
    pub confidence: f32,
    pub confidences: Vec<f32>,
    pub pest: Option<String>,
    pub pesticide: Option<String>,
    pub reference_image: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelView {
    pub index: usize,
    pub pest: String,
    pub pesticide: String,
    pub reference_image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub success: bool,
    pub labels: Vec<LabelView>,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}
