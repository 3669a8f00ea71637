pub mod credential_store;
pub mod session_store;
