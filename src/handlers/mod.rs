pub mod auth;
pub mod detect;
pub mod fallback;
pub mod health;
pub mod labels;
pub mod metrics;
