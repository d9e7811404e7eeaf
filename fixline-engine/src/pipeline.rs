/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Per-connection processing pipeline.
//!
//! A [`PipelineInitializer`] holds everything needed to serve a connection:
//! the validated session configuration, the handler set and the connector
//! configuration. [`PipelineInitializer::spawn`] installs codec, session
//! stage and dispatcher on a socket and runs them as one task on the worker
//! runtime. The task owns all per-connection state, so inbound messages are
//! processed strictly one after another.

use crate::close::{CloseFuture, CloseGuard};
use crate::config::ConnectorConfig;
use crate::dispatch::Dispatcher;
use crate::handler::{AdminHandler, ApplicationHandler, Command, HandlerContext};
use fixline_core::error::{ConfigError, ConnectionError};
use fixline_core::message::Message;
use fixline_session::{Role, SessionAction, SessionConfig, SessionSettingsProvider, SessionStage};
use fixline_transport::{FixCodec, tcp};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, info, info_span, trace, warn};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Builds and installs the processing chain for new connections.
pub struct PipelineInitializer {
    role: Role,
    session: SessionConfig,
    admin: Arc<dyn AdminHandler>,
    handlers: Arc<[Arc<dyn ApplicationHandler>]>,
    config: ConnectorConfig,
}

impl std::fmt::Debug for PipelineInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineInitializer")
            .field("role", &self.role)
            .field("session", &self.session)
            .field("handlers", &self.handlers.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PipelineInitializer {
    /// Reads and validates settings from `provider`.
    ///
    /// # Errors
    /// Returns `ConfigError` before any network activity if the settings
    /// cannot be produced or are invalid for `role`.
    pub fn new(
        role: Role,
        provider: &dyn SessionSettingsProvider,
        admin: Arc<dyn AdminHandler>,
        handlers: Vec<Arc<dyn ApplicationHandler>>,
        config: ConnectorConfig,
    ) -> Result<Self, ConfigError> {
        let settings = provider.settings()?;
        let session = SessionConfig::from_settings(&settings, role)?;
        Ok(Self::with_session(role, session, admin, handlers, config))
    }

    /// Uses an already built session configuration.
    #[must_use]
    pub fn with_session(
        role: Role,
        session: SessionConfig,
        admin: Arc<dyn AdminHandler>,
        handlers: Vec<Arc<dyn ApplicationHandler>>,
        config: ConnectorConfig,
    ) -> Self {
        Self {
            role,
            session,
            admin,
            handlers: handlers.into(),
            config,
        }
    }

    /// Returns the session configuration applied to each connection.
    #[must_use]
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Installs the pipeline on a socket established on another runtime.
    ///
    /// The socket is re-registered with the reactor behind `handle`.
    ///
    /// # Errors
    /// Returns `ConnectionError::Connect` if the socket cannot be moved.
    pub fn spawn_std(
        &self,
        handle: &Handle,
        stream: std::net::TcpStream,
    ) -> Result<Connection, ConnectionError> {
        let _entered = handle.enter();
        let stream = TcpStream::from_std(stream).map_err(|e| ConnectionError::Connect {
            address: "handoff".to_string(),
            reason: e.to_string(),
        })?;
        self.spawn(handle, stream)
    }

    /// Installs the pipeline on a socket owned by `handle`'s runtime.
    ///
    /// # Errors
    /// Returns `ConnectionError::Connect` if the socket addresses are
    /// unavailable (the peer already went away).
    pub fn spawn(&self, handle: &Handle, stream: TcpStream) -> Result<Connection, ConnectionError> {
        let address_error = |e: std::io::Error| ConnectionError::Connect {
            address: "peer".to_string(),
            reason: e.to_string(),
        };
        let remote_addr = stream.peer_addr().map_err(address_error)?;
        let local_addr = stream.local_addr().map_err(address_error)?;
        tcp::configure(&stream, self.config.tcp_options()).map_err(address_error)?;

        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        let (commands, inbox) = mpsc::unbounded_channel();
        let (guard, close) = CloseGuard::new();

        let codec = FixCodec::new(self.session.begin_string.clone())
            .with_max_message_size(self.session.max_message_size)
            .with_checksum_validation(self.session.validate_checksum);
        let driver = Driver {
            framed: Framed::with_capacity(stream, codec, self.config.read_buffer_capacity),
            stage: SessionStage::new(self.role, self.session.clone()),
            dispatcher: Dispatcher::new(
                Arc::clone(&self.admin),
                Arc::clone(&self.handlers),
                self.config.handler_error_policy,
            ),
            ctx: HandlerContext::new(id, remote_addr, commands.clone()),
            inbox,
            config: self.config.clone(),
        };

        let span = info_span!("fix_connection", id, role = ?self.role, peer = %remote_addr);
        handle.spawn(
            async move {
                let _guard = guard;
                driver.run().await;
            }
            .instrument(span),
        );

        Ok(Connection {
            id,
            remote_addr,
            local_addr,
            commands,
            close,
        })
    }
}

/// Handle to a running connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: u64,
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    commands: mpsc::UnboundedSender<Command>,
    close: CloseFuture,
}

impl Connection {
    /// Queues a message for stamping, encoding and transmission.
    ///
    /// # Errors
    /// Returns `ConnectionError::Closed` if the connection has ended.
    pub fn send(&self, message: Message) -> Result<(), ConnectionError> {
        self.commands
            .send(Command::Write(message))
            .map_err(|_| ConnectionError::Closed)
    }

    /// Asks the connection to log out and close. Does not wait.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Returns the latch completed when the connection closes.
    #[must_use]
    pub fn close_future(&self) -> CloseFuture {
        self.close.clone()
    }

    /// Returns true if the connection has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    /// Returns the process-unique connection number.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the counterparty address.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns the local socket address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct Driver {
    framed: Framed<TcpStream, FixCodec>,
    stage: SessionStage,
    dispatcher: Dispatcher,
    ctx: HandlerContext,
    inbox: mpsc::UnboundedReceiver<Command>,
    config: ConnectorConfig,
}

impl Driver {
    async fn run(mut self) {
        info!("connection established");
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let actions = self.stage.start();
        let mut flow = self.apply(actions).await;

        while flow == Flow::Continue {
            let actions = tokio::select! {
                frame = self.framed.next() => match frame {
                    Some(Ok(message)) => {
                        trace!(%message, "inbound");
                        self.stage.on_message(message)
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "inbound stream failed");
                        break;
                    }
                    None => {
                        info!("peer closed the connection");
                        break;
                    }
                },
                command = self.inbox.recv() => match command {
                    Some(Command::Write(message)) => vec![SessionAction::Send(message)],
                    Some(Command::Close) | None => self.stage.on_close_request(),
                },
                _ = ticker.tick() => self.stage.on_tick(),
            };
            flow = self.apply(actions).await;
        }

        self.inbox.close();
        if let Err(e) = self.framed.close().await {
            debug!(error = %e, "error while closing socket");
        }
        info!("connection closed");
    }

    /// Carries out session actions in order, then flushes.
    ///
    /// A handler failure under the disconnect policy feeds the session's
    /// close actions through the same path.
    async fn apply(&mut self, mut actions: Vec<SessionAction>) -> Flow {
        loop {
            let mut flow = Flow::Continue;
            let mut close_requested = false;

            for action in actions {
                match action {
                    SessionAction::Send(message) => {
                        let message = self.stage.prepare_outbound(message);
                        trace!(%message, "outbound");
                        if let Err(e) = self.framed.feed(message).await {
                            warn!(error = %e, "write failed");
                            return Flow::Stop;
                        }
                    }
                    SessionAction::Deliver(message) => {
                        if let Err(err) = self.dispatcher.dispatch_message(&self.ctx, message).await {
                            close_requested |= self.dispatcher.report(&self.ctx, &err).await;
                        }
                    }
                    SessionAction::Event(event) => {
                        if let Err(err) = self.dispatcher.dispatch_event(&self.ctx, &event).await {
                            close_requested |= self.dispatcher.report(&self.ctx, &err).await;
                        }
                    }
                    SessionAction::Disconnect => flow = Flow::Stop,
                }
            }

            if let Err(e) = self.framed.flush().await {
                warn!(error = %e, "flush failed");
                return Flow::Stop;
            }

            if !close_requested || flow == Flow::Stop {
                return flow;
            }
            debug!("closing after handler failure");
            actions = self.stage.on_close_request();
        }
    }
}
