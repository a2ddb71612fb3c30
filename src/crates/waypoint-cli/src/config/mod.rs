//! CLI configuration

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{CheckpointConfig, LoggingConfig, ModelConfig, Provider, WaypointConfig};
