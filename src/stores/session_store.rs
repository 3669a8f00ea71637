use crate::models::session::Session;
use crate::utils::time::current_timestamp;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory table of logged-in sessions keyed by bearer token.
/// Sessions live until logout or process exit.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open a session for an authenticated user and return it.
    ///
    /// Sessions never expire: each call adds an entry and only `remove`
    /// shrinks the map.
    pub fn create(&self, username: &str) -> Arc<Session> {
        let token = hex::encode(rand::random::<[u8; 32]>());
        let session = Arc::new(Session::new(token.clone(), username.to_string(), current_timestamp()));
        self.sessions.insert(token, Arc::clone(&session));
        session
    }

    pub fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.get(token).map(|entry| Arc::clone(entry.value()))
    }

    /// End a session. Returns the removed session if the token was live
    pub fn remove(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
