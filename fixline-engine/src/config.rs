/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Connector configuration.
//!
//! Transport and runtime knobs that are not part of the FIX session
//! settings. Passed to a connector explicitly; [`ConnectorConfig::from_env`]
//! is an opt-in convenience.

use fixline_core::error::ConfigError;
use fixline_transport::{DEFAULT_MAX_MESSAGE_SIZE, TcpOptions};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding [`ConnectorConfig::tcp_nodelay`].
pub const ENV_TCP_NODELAY: &str = "FIXLINE_TCP_NODELAY";
/// Environment variable overriding [`ConnectorConfig::worker_threads`].
pub const ENV_WORKER_THREADS: &str = "FIXLINE_WORKER_THREADS";
/// Environment variable overriding [`ConnectorConfig::connect_timeout`].
pub const ENV_CONNECT_TIMEOUT_MS: &str = "FIXLINE_CONNECT_TIMEOUT_MS";

/// What happens to a connection after one of its handlers fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerErrorPolicy {
    /// Log, report to the admin handler, keep the connection.
    #[default]
    Continue,
    /// Log, report, then log out and close the connection.
    Disconnect,
}

/// Runtime and transport configuration for a connector.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Disable Nagle's algorithm on the socket.
    pub tcp_nodelay: bool,
    /// Worker threads in the I/O runtime.
    pub worker_threads: usize,
    /// Bound on connection establishment; `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
    /// Bound on closing the connection and shutting runtimes down.
    pub shutdown_timeout: Duration,
    /// Initial capacity of the per-connection read buffer, reused across
    /// frames.
    pub read_buffer_capacity: usize,
    /// Policy applied when a handler fails.
    pub handler_error_policy: HandlerErrorPolicy,
    /// How often session timers are evaluated.
    pub tick_interval: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            worker_threads: 8,
            connect_timeout: None,
            shutdown_timeout: Duration::from_secs(5),
            read_buffer_capacity: 8 * 1024,
            handler_error_policy: HandlerErrorPolicy::Continue,
            tick_interval: Duration::from_millis(500),
        }
    }
}

impl ConnectorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the default configuration with overrides from the process
    /// environment, read once, now.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TCP_NODELAY) {
            config.tcp_nodelay = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "y" | "yes" => true,
                "0" | "false" | "n" | "no" => false,
                _ => return Err(invalid(ENV_TCP_NODELAY, &raw, "expected true or false")),
            };
        }
        if let Some(threads) = parse_env::<usize>(&lookup, ENV_WORKER_THREADS)? {
            if threads == 0 {
                return Err(invalid(ENV_WORKER_THREADS, "0", "must be positive"));
            }
            config.worker_threads = threads;
        }
        if let Some(ms) = parse_env::<u64>(&lookup, ENV_CONNECT_TIMEOUT_MS)? {
            config.connect_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(config)
    }

    /// Sets TCP no-delay.
    #[must_use]
    pub const fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    /// Sets the worker thread count (at least one).
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the shutdown timeout.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the initial read buffer capacity.
    #[must_use]
    pub fn with_read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity.min(DEFAULT_MAX_MESSAGE_SIZE);
        self
    }

    /// Sets the handler error policy.
    #[must_use]
    pub const fn with_handler_error_policy(mut self, policy: HandlerErrorPolicy) -> Self {
        self.handler_error_policy = policy;
        self
    }

    /// Sets the timer tick interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Returns the socket options derived from this configuration.
    #[must_use]
    pub const fn tcp_options(&self) -> TcpOptions {
        TcpOptions {
            nodelay: self.tcp_nodelay,
            connect_timeout: self.connect_timeout,
        }
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| invalid(key, &raw, "expected a non-negative integer"))
        })
        .transpose()
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
