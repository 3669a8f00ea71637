use anyhow::{Context, Result};
use tracing::info;

use crate::core::config::LabelsConfig;
use crate::core::state::AppState;
use crate::labels::table::LabelTable;

// this runs at boot time
pub fn load_label_table(config: &LabelsConfig) -> Result<LabelTable> {
    let table = match &config.path {
        Some(path) => LabelTable::from_file(path)
            .with_context(|| format!("Failed to load label table from '{}'", path.display()))?,
        None => LabelTable::builtin(),
    };

    info!(
        classes = table.len(),
        source = %config
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        "Label table ready"
    );

    Ok(table)
}

/// Open the credential file once so a corrupt store fails the boot
/// instead of the first login.
pub fn prepare_credentials(state: &AppState) -> Result<()> {
    let users = state.credentials.load_all().with_context(|| {
        format!(
            "Failed to read credential file '{}'",
            state.credentials.path().display()
        )
    })?;

    info!(
        path = %state.credentials.path().display(),
        users = users.len(),
        "Credential store ready"
    );

    Ok(())
}

/// Fetch and deserialize the classifier before the first request
pub async fn warm_classifier(state: &AppState) -> Result<()> {
    let model = state.classifier.config();
    info!(
        repo_id = %model.repo_id,
        revision = %model.revision,
        filename = %model.filename,
        local_path = ?model.local_path,
        "Loading pest classifier"
    );

    state
        .classifier
        .load()
        .await
        .context("Failed to load the pest classifier")?;

    Ok(())
}
