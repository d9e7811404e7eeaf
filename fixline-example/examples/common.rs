//! Common utilities shared across demos.

#![allow(dead_code)]

use std::env;

/// Default server port.
pub const DEFAULT_PORT: u16 = 9880;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Demo configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Sender CompID.
    pub sender_comp_id: String,
    /// Target CompID.
    pub target_comp_id: String,
    /// User whose status is queried.
    pub username: String,
}

impl DemoConfig {
    /// Reads `FIX_HOST`, `FIX_PORT`, `FIX_SENDER`, `FIX_TARGET` and
    /// `FIX_USER`.
    #[must_use]
    pub fn from_env(sender: &str, target: &str) -> Self {
        Self {
            host: env::var("FIX_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("FIX_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            sender_comp_id: env::var("FIX_SENDER").unwrap_or_else(|_| sender.to_string()),
            target_comp_id: env::var("FIX_TARGET").unwrap_or_else(|_| target.to_string()),
            username: env::var("FIX_USER").unwrap_or_else(|_| "user".to_string()),
        }
    }
}

/// Initializes logging for demos.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
