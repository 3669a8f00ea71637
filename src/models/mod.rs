pub mod api;
pub mod label;
pub mod prediction;
pub mod session;
