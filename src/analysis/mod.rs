pub mod metrics;
pub mod render;
