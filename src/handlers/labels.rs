use crate::core::error::ReferenceError;
use crate::core::state::AppState;
use crate::models::api::{LabelView, LabelsResponse};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// GET /labels
pub async fn labels_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let labels = state
        .labels
        .iter()
        .map(|entry| LabelView {
            index: entry.index,
            pest: entry.pest.clone(),
            pesticide: entry.pesticide.clone(),
            reference_image: format!("/reference/{}", entry.index),
        })
        .collect();

    (
        StatusCode::OK,
        Json(LabelsResponse {
            success: true,
            labels,
        }),
    )
}

/// Pesticide illustration for a class
///
/// GET /reference/{index}. Public so a browser `<img>` can load it.
pub async fn reference_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Response, ReferenceError> {
    let entry = state
        .labels
        .resolve(index)
        .ok_or(ReferenceError::UnknownClass(index))?;

    let image = state.references.fetch(entry).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.content_type)],
        image.bytes,
    )
        .into_response())
}
