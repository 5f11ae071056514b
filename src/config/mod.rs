/// Database configuration and connection management
pub mod database;

/// Seed data and staff sessions loaded from config.toml
pub mod seed;

/// Listening address and file locations from environment variables
pub mod server;
