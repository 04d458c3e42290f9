//! TOML configuration for the index.

pub mod loader;
pub mod types;

pub use loader::{default_config_path, ConfigError, ConfigLoader};
pub use types::{ConfigFile, IndexConfig, LoggingConfig};
