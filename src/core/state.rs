// Application state (AppState)

use crate::classifier::loader::ClassifierLoader;
use crate::core::config::Config;
use crate::labels::reference::ReferenceImages;
use crate::labels::table::LabelTable;
use crate::metrics::collector::Metrics;
use crate::models::session::Session;
use crate::stores::{credential_store::CredentialStore, session_store::SessionStore};
use crate::utils::auth::bearer_token;
use anyhow::Result;
use axum::http::{header, HeaderMap};
use std::sync::Arc;

/// Shared application state
///
/// Everything a request handler can reach. Fields are Arc-wrapped so the
/// state clones cheaply into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Username/password file gating the detector
    pub credentials: Arc<CredentialStore>,

    /// Live login sessions
    pub sessions: Arc<SessionStore>,

    /// Load-once pest classifier
    pub classifier: Arc<ClassifierLoader>,

    /// Class index to pest / pesticide mapping
    pub labels: Arc<LabelTable>,

    /// Pesticide illustration resolver
    pub references: Arc<ReferenceImages>,

    pub metrics: Arc<Metrics>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, classifier: ClassifierLoader, labels: LabelTable) -> Result<Self> {
        let config = Arc::new(config);

        let references = Arc::new(ReferenceImages::new(config.labels.assets_dir.clone())?);

        Ok(Self {
            credentials: Arc::new(CredentialStore::new(config.credentials.path.clone())),
            sessions: Arc::new(SessionStore::new()),
            classifier: Arc::new(classifier),
            labels: Arc::new(labels),
            references,
            metrics: Arc::new(Metrics::new()),
            config,
        })
    }

    /// Session named by the request's bearer token, if it is still live
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = bearer_token(value)?;
        self.sessions.get(token)
    }
}
