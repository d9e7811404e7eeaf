/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Initiator-side connector.
//!
//! [`FixClient`] hides its async machinery behind blocking lifecycle calls:
//! `connect` returns once the TCP connection is up, `disconnect` returns
//! once it is gone and the runtimes are released.

use crate::close::CloseFuture;
use crate::config::ConnectorConfig;
use crate::handler::{AdminHandler, ApplicationHandler, NoOpAdminHandler};
use crate::pipeline::{Connection, PipelineInitializer};
use crate::runtime;
use fixline_core::error::{ConnectionError, FixError, IllegalStateError, Result};
use fixline_core::message::Message;
use fixline_session::{
    PropertySessionSettingsProvider, Role, SessionSettings, SessionSettingsProvider,
    StaticSessionSettingsProvider,
};
use fixline_transport::tcp;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Runtimes and connection held between `connect` and `disconnect`.
struct Active {
    boss: Runtime,
    workers: Runtime,
    connection: Connection,
}

impl Active {
    fn shutdown(self, timeout: std::time::Duration) {
        self.workers.shutdown_timeout(timeout);
        self.boss.shutdown_timeout(timeout);
    }
}

/// FIX initiator holding at most one connection at a time.
///
/// # Example
/// ```no_run
/// use fixline_engine::FixClient;
/// use fixline_session::SessionSettings;
///
/// let mut client = FixClient::new().with_settings(
///     SessionSettings::new()
///         .with("SenderCompID", "CLIENT")
///         .with("TargetCompID", "SERVER"),
/// );
/// let closed = client.connect("127.0.0.1", 9880)?;
/// closed.wait();
/// client.disconnect()?;
/// # Ok::<(), fixline_core::FixError>(())
/// ```
pub struct FixClient {
    config: ConnectorConfig,
    settings: Option<Arc<dyn SessionSettingsProvider>>,
    admin: Arc<dyn AdminHandler>,
    handlers: Vec<Arc<dyn ApplicationHandler>>,
    active: Option<Active>,
}

impl std::fmt::Debug for FixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixClient")
            .field("config", &self.config)
            .field("has_settings", &self.settings.is_some())
            .field("admin", &self.admin.name())
            .field("handlers", &self.handlers.len())
            .field("connected", &self.active.is_some())
            .finish()
    }
}

impl Default for FixClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FixClient {
    /// Creates a client with default configuration, a no-op admin handler
    /// and an empty application chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::default(),
            settings: None,
            admin: Arc::new(NoOpAdminHandler),
            handlers: Vec::new(),
            active: None,
        }
    }

    /// Sets the connector configuration.
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the admin handler.
    #[must_use]
    pub fn with_admin_handler(mut self, handler: impl AdminHandler + 'static) -> Self {
        self.admin = Arc::new(handler);
        self
    }

    /// Appends a handler to the application chain.
    #[must_use]
    pub fn with_application_handler(mut self, handler: impl ApplicationHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Uses one object as both admin handler and sole application handler.
    #[must_use]
    pub fn with_application<A>(mut self, application: A) -> Self
    where
        A: AdminHandler + ApplicationHandler + 'static,
    {
        let application = Arc::new(application);
        self.admin = Arc::clone(&application) as Arc<dyn AdminHandler>;
        self.handlers = vec![application as Arc<dyn ApplicationHandler>];
        self
    }

    /// Uses fixed in-code settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.set_session_settings_provider(StaticSessionSettingsProvider::new(settings));
        self
    }

    /// Reads settings from a `.properties` file at connect time.
    pub fn set_settings_resource(&mut self, path: impl Into<PathBuf>) {
        self.set_session_settings_provider(PropertySessionSettingsProvider::new(path));
    }

    /// Installs a settings provider.
    pub fn set_session_settings_provider(
        &mut self,
        provider: impl SessionSettingsProvider + 'static,
    ) {
        self.settings = Some(Arc::new(provider));
    }

    /// Returns the connector configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Connects to `host:port` and starts the session.
    ///
    /// Blocks until the TCP connection is established or has failed. The
    /// returned [`CloseFuture`] completes when the connection later closes
    /// for any reason.
    ///
    /// # Errors
    /// - `IllegalStateError` if already connected, no settings provider is
    ///   configured, or called from inside an async runtime
    /// - `ConfigError` if the settings are missing or invalid
    /// - `ConnectionError` if resolution, connection or runtime setup fails;
    ///   the client is left disconnected and reusable
    pub fn connect(&mut self, host: &str, port: u16) -> Result<CloseFuture> {
        runtime::ensure_blocking_allowed()?;
        if self.active.is_some() {
            return Err(IllegalStateError::AlreadyConnected.into());
        }
        let provider = self
            .settings
            .as_deref()
            .ok_or(IllegalStateError::MissingSettingsProvider)?;
        let pipeline = PipelineInitializer::new(
            Role::Initiator,
            provider,
            Arc::clone(&self.admin),
            self.handlers.clone(),
            self.config.clone(),
        )?;

        let boss = runtime::build("fixline-boss", 1)?;
        let workers = match runtime::build("fixline-worker", self.config.worker_threads) {
            Ok(workers) => workers,
            Err(e) => {
                boss.shutdown_background();
                return Err(e.into());
            }
        };

        let options = self.config.tcp_options();
        let established = boss.block_on(async {
            let stream = tcp::connect(host, port, options).await?;
            stream.into_std().map_err(|e| ConnectionError::Connect {
                address: format!("{host}:{port}"),
                reason: e.to_string(),
            })
        });
        let connection =
            match established.and_then(|stream| pipeline.spawn_std(workers.handle(), stream)) {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(host, port, error = %e, "connect failed");
                    workers.shutdown_background();
                    boss.shutdown_background();
                    return Err(e.into());
                }
            };

        info!(
            remote = %connection.remote_addr(),
            local = %connection.local_addr(),
            "connected"
        );
        let close = connection.close_future();
        self.active = Some(Active {
            boss,
            workers,
            connection,
        });
        Ok(close)
    }

    /// Connects to `127.0.0.1:port`.
    ///
    /// # Errors
    /// Same as [`FixClient::connect`].
    pub fn connect_port(&mut self, port: u16) -> Result<CloseFuture> {
        self.connect("127.0.0.1", port)
    }

    /// Connects to the `SocketConnectHost`/`SocketConnectPort` found in the
    /// settings.
    ///
    /// # Errors
    /// Same as [`FixClient::connect`], plus `ConfigError` if either key is
    /// missing.
    pub fn connect_configured(&mut self) -> Result<CloseFuture> {
        let provider = self
            .settings
            .as_deref()
            .ok_or(IllegalStateError::MissingSettingsProvider)?;
        let (host, port) = provider.settings()?.socket_connect_address()?;
        self.connect(&host, port)
    }

    /// Closes the connection and releases the runtimes.
    ///
    /// Sends a Logout if the session is logged on, waits for the connection
    /// to close, then shuts both runtimes down, each step bounded by the
    /// configured shutdown timeout. Runtimes are released even if the close
    /// did not complete in time.
    ///
    /// # Errors
    /// `IllegalStateError::NotConnected` without an active connection;
    /// `IllegalStateError::BlockingInAsyncContext` inside an async runtime.
    pub fn disconnect(&mut self) -> Result<()> {
        runtime::ensure_blocking_allowed()?;
        let active = self.active.take().ok_or(IllegalStateError::NotConnected)?;

        active.connection.close();
        let timeout = self.config.shutdown_timeout;
        if !active.connection.close_future().wait_timeout(timeout) {
            warn!(?timeout, "connection did not close in time, shutting down anyway");
        }
        active.shutdown(timeout);
        info!("disconnected");
        Ok(())
    }

    /// Queues a message on the active connection. Does not wait for
    /// delivery.
    ///
    /// # Errors
    /// `IllegalStateError::NotConnected` without an active connection;
    /// `ConnectionError::Closed` if the connection has already closed.
    pub fn send(&self, message: Message) -> Result<()> {
        let active = self.active.as_ref().ok_or(IllegalStateError::NotConnected)?;
        active.connection.send(message).map_err(FixError::from)
    }

    /// Returns true while a connection is held and still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.connection.is_closed())
    }

    /// Returns the counterparty address of the held connection.
    #[must_use]
    pub fn remote_address(&self) -> Option<SocketAddr> {
        self.active.as_ref().map(|a| a.connection.remote_addr())
    }

    /// Returns the local address of the held connection.
    #[must_use]
    pub fn local_address(&self) -> Option<SocketAddr> {
        self.active.as_ref().map(|a| a.connection.local_addr())
    }
}

impl Drop for FixClient {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.connection.close();
            active.workers.shutdown_background();
            active.boss.shutdown_background();
        }
    }
}
