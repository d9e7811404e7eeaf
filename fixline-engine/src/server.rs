/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Acceptor-side connector.
//!
//! [`FixServer`] listens on a port and serves every accepted connection
//! with its own acceptor pipeline on a shared worker runtime.

use crate::config::ConnectorConfig;
use crate::handler::{AdminHandler, ApplicationHandler};
use crate::pipeline::{Connection, PipelineInitializer};
use crate::runtime;
use fixline_core::error::{ConfigError, ConnectionError, IllegalStateError, Result};
use fixline_core::types::CompId;
use fixline_session::{Role, SessionConfig, SessionSettingsProvider};
use fixline_transport::tcp;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

/// SenderCompID used when no settings provider is configured.
pub const DEFAULT_SERVER_COMP_ID: &str = "SERVER";

/// BeginString used when no settings provider is configured.
pub const DEFAULT_BEGIN_STRING: &str = "FIX.4.4";

type Registry = Arc<Mutex<HashMap<u64, Connection>>>;

struct Running {
    runtime: Runtime,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    connections: Registry,
}

/// FIX acceptor.
pub struct FixServer {
    port: u16,
    config: ConnectorConfig,
    settings: Option<Arc<dyn SessionSettingsProvider>>,
    admin: Arc<dyn AdminHandler>,
    handlers: Vec<Arc<dyn ApplicationHandler>>,
    running: Option<Running>,
}

impl std::fmt::Debug for FixServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixServer")
            .field("port", &self.port)
            .field("config", &self.config)
            .field("admin", &self.admin.name())
            .field("handlers", &self.handlers.len())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl FixServer {
    /// Creates a server for `port`. Port 0 binds an ephemeral port, reported
    /// by [`FixServer::local_addr`] after `start`.
    #[must_use]
    pub fn new(
        port: u16,
        admin: Arc<dyn AdminHandler>,
        handlers: Vec<Arc<dyn ApplicationHandler>>,
    ) -> Self {
        Self {
            port,
            config: ConnectorConfig::default(),
            settings: None,
            admin,
            handlers,
            running: None,
        }
    }

    /// Sets the connector configuration.
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads acceptor settings from `provider` instead of the permissive
    /// defaults.
    #[must_use]
    pub fn with_settings_provider(mut self, provider: impl SessionSettingsProvider + 'static) -> Self {
        self.settings = Some(Arc::new(provider));
        self
    }

    /// Binds the port and starts accepting connections. Blocks until the
    /// listener is bound.
    ///
    /// # Errors
    /// - `IllegalStateError` if already started or called inside a runtime
    /// - `ConfigError` if the provider's settings are invalid
    /// - `ConnectionError` if the runtime cannot start or the port cannot be
    ///   bound
    pub fn start(&mut self) -> Result<SocketAddr> {
        runtime::ensure_blocking_allowed()?;
        if self.running.is_some() {
            return Err(IllegalStateError::AlreadyConnected.into());
        }
        let pipeline = self.pipeline()?;

        let runtime = runtime::build("fixline-server", self.config.worker_threads)?;
        let listener = match runtime.block_on(tcp::bind(self.port)) {
            Ok(listener) => listener,
            Err(e) => {
                runtime.shutdown_background();
                return Err(e.into());
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                runtime.shutdown_background();
                return Err(ConnectionError::Connect {
                    address: format!("0.0.0.0:{}", self.port),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let (shutdown, stop) = watch::channel(false);
        let connections = Registry::default();
        runtime.spawn(
            accept_loop(listener, pipeline, Arc::clone(&connections), stop)
                .instrument(info_span!("fix_server", %local_addr)),
        );

        info!(%local_addr, "server listening");
        self.running = Some(Running {
            runtime,
            local_addr,
            shutdown,
            connections,
        });
        Ok(local_addr)
    }

    /// Stops accepting, closes every open connection and shuts the runtime
    /// down, bounded by the configured shutdown timeout.
    ///
    /// # Errors
    /// `IllegalStateError::NotConnected` if the server is not running;
    /// `IllegalStateError::BlockingInAsyncContext` inside a runtime.
    pub fn stop(&mut self) -> Result<()> {
        runtime::ensure_blocking_allowed()?;
        let running = self.running.take().ok_or(IllegalStateError::NotConnected)?;

        let _ = running.shutdown.send(true);
        let open: Vec<Connection> = running.connections.lock().drain().map(|(_, c)| c).collect();
        for connection in &open {
            connection.close();
        }
        let timeout = self.config.shutdown_timeout;
        for connection in &open {
            if !connection.close_future().wait_timeout(timeout) {
                warn!(id = connection.id(), "connection did not close in time");
            }
        }
        running.runtime.shutdown_timeout(timeout);
        info!(local_addr = %running.local_addr, "server stopped");
        Ok(())
    }

    /// Returns the bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Returns true between `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Returns the number of currently open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.running.as_ref().map_or(0, |r| {
            let mut connections = r.connections.lock();
            connections.retain(|_, c| !c.is_closed());
            connections.len()
        })
    }

    fn pipeline(&self) -> std::result::Result<PipelineInitializer, ConfigError> {
        let admin = Arc::clone(&self.admin);
        let handlers = self.handlers.clone();
        let config = self.config.clone();
        match self.settings.as_deref() {
            Some(provider) => {
                PipelineInitializer::new(Role::Acceptor, provider, admin, handlers, config)
            }
            None => {
                let sender = CompId::new(DEFAULT_SERVER_COMP_ID).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        key: "SenderCompID".to_string(),
                        value: DEFAULT_SERVER_COMP_ID.to_string(),
                        reason: "invalid comp id".to_string(),
                    }
                })?;
                let session = SessionConfig::accepting_any(sender, DEFAULT_BEGIN_STRING);
                Ok(PipelineInitializer::with_session(
                    Role::Acceptor,
                    session,
                    admin,
                    handlers,
                    config,
                ))
            }
        }
    }
}

impl Drop for FixServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            for connection in running.connections.lock().values() {
                connection.close();
            }
            running.runtime.shutdown_background();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    pipeline: PipelineInitializer,
    connections: Registry,
    mut stop: watch::Receiver<bool>,
) {
    let handle = Handle::current();
    loop {
        tokio::select! {
            _ = stop.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    match pipeline.spawn(&handle, stream) {
                        Ok(connection) => {
                            let mut registry = connections.lock();
                            registry.retain(|_, c| !c.is_closed());
                            registry.insert(connection.id(), connection);
                        }
                        Err(e) => warn!(%peer, error = %e, "failed to install pipeline"),
                    }
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
    debug!("accept loop stopped");
}
