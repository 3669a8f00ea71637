pub mod classifier;
pub mod core;
pub mod handlers;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod stores;
pub mod utils;

#[cfg(test)]
mod test_support;
