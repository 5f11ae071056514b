//! Server settings read from the environment.

use std::net::SocketAddr;

use crate::errors::{Error, Result};

/// Default listening address when `BIND_ADDRESS` is not set.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// Default path of the seed configuration when `CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Gets the address the web server listens on.
pub fn get_bind_address() -> Result<SocketAddr> {
    let raw = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    raw.parse().map_err(|e| Error::Config {
        message: format!("Invalid BIND_ADDRESS '{raw}': {e}"),
    })
}

/// Gets the path of the seed configuration file.
#[must_use]
pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
