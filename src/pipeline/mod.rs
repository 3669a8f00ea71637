pub mod predict;
pub mod preprocess;
