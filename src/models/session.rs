#[derive(Clone, Debug)]
pub struct Session {
    /// Bearer token handed out at login (64 hex characters)
    pub token: String,
    pub username: String,
    /// Unix seconds
    pub created_at: i64,
}

impl Session {
    pub fn new(token: String, username: String, created_at: i64) -> Self {
        Self {
            token,
            username,
            created_at,
        }
    }
}
