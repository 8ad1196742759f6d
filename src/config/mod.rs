/// Database configuration and connection management
pub mod database;

/// Engine settings loading from TOML and environment variables
pub mod settings;
