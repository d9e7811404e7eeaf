/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Handler callback interfaces.
//!
//! Two capabilities: [`AdminHandler`] receives
//! session events only, [`ApplicationHandler`] receives business messages
//! only. Both talk back to the connection through a [`HandlerContext`].

use async_trait::async_trait;
use fixline_core::error::{ConnectionError, DecodeError, DispatchError, FixError};
use fixline_core::message::Message;
use fixline_session::SessionEvent;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc;

/// Instruction for a connection's driver task.
#[derive(Debug)]
pub(crate) enum Command {
    /// Stamp, encode and write a message.
    Write(Message),
    /// Log out (if logged on) and close.
    Close,
}

/// A handler's view of the connection it is serving.
///
/// Writes are queued on the connection's single outbound queue, so they go
/// out in submission order after the handler returns.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    connection_id: u64,
    remote_addr: SocketAddr,
    commands: mpsc::UnboundedSender<Command>,
}

impl HandlerContext {
    pub(crate) fn new(
        connection_id: u64,
        remote_addr: SocketAddr,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            connection_id,
            remote_addr,
            commands,
        }
    }

    /// Queues a message for transmission.
    ///
    /// # Errors
    /// Returns `ConnectionError::Closed` once the connection has ended.
    pub fn write(&self, message: Message) -> Result<(), ConnectionError> {
        self.commands
            .send(Command::Write(message))
            .map_err(|_| ConnectionError::Closed)
    }

    /// Asks the connection to log out and close after pending writes.
    ///
    /// Closing an already closed connection is a no-op.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Returns the process-unique connection number.
    #[must_use]
    pub const fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Returns the counterparty's socket address.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns true once the connection's driver has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Error returned by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A fixline operation failed inside the handler.
    #[error(transparent)]
    Fix(#[from] FixError),

    /// Writing to the connection failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A field could not be read from the message.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Handler-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Creates a handler-specific error with the given text.
    #[must_use]
    pub fn new(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Receives session-level events: logon, logout, heartbeat timeout, reject.
#[async_trait]
pub trait AdminHandler: Send + Sync {
    /// Name used in logs and [`DispatchError`]s.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called for every session event on the connection.
    ///
    /// # Errors
    /// A returned error is reported as a [`DispatchError`].
    async fn on_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> Result<(), HandlerError>;

    /// Called when any handler on the connection fails.
    async fn on_dispatch_error(&self, _ctx: &HandlerContext, _error: &DispatchError) {}
}

/// Receives business messages, as one link of the application chain.
#[async_trait]
pub trait ApplicationHandler: Send + Sync {
    /// Name used in logs and [`DispatchError`]s.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns true if this handler consumes `message`.
    ///
    /// Messages that are not consumed pass to the next handler unchanged.
    fn accepts(&self, _message: &Message) -> bool {
        true
    }

    /// Processes a consumed message.
    ///
    /// Messages pushed onto `out` continue down the chain in place of the
    /// original.
    ///
    /// # Errors
    /// A returned error is reported as a [`DispatchError`] and stops the
    /// chain for this message.
    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        out: &mut Vec<Message>,
    ) -> Result<(), HandlerError>;
}

/// Admin handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAdminHandler;

#[async_trait]
impl AdminHandler for NoOpAdminHandler {
    async fn on_event(
        &self,
        _ctx: &HandlerContext,
        _event: &SessionEvent,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Application handler that consumes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpApplicationHandler;

#[async_trait]
impl ApplicationHandler for NoOpApplicationHandler {
    fn accepts(&self, _message: &Message) -> bool {
        false
    }

    async fn on_message(
        &self,
        _ctx: &HandlerContext,
        _message: &Message,
        _out: &mut Vec<Message>,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fixline_core::message::MsgType;
    use fixline_session::{LogoutEvent, LogoutOrigin};

    pub(crate) fn context() -> (HandlerContext, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let addr = SocketAddr::from(([127, 0, 0, 1], 9880));
        (HandlerContext::new(7, addr, tx), rx)
    }

    #[test]
    fn test_context_write_and_close_are_queued_in_order() {
        let (ctx, mut rx) = context();
        ctx.write(Message::new("BE")).unwrap();
        ctx.close();

        assert!(matches!(rx.try_recv(), Ok(Command::Write(m)) if m.msg_type() == &MsgType::UserRequest));
        assert!(matches!(rx.try_recv(), Ok(Command::Close)));
    }

    #[test]
    fn test_context_write_after_driver_stopped() {
        let (ctx, rx) = context();
        drop(rx);
        assert!(ctx.is_closed());
        assert_eq!(ctx.write(Message::new("BE")), Err(ConnectionError::Closed));
        ctx.close();
    }

    #[test]
    fn test_handler_error_conversions() {
        let err: HandlerError = DecodeError::MissingRequiredField { tag: 926 }.into();
        assert!(matches!(err, HandlerError::Decode(_)));
        assert!(err.to_string().contains("926"));

        let err: HandlerError = ConnectionError::Closed.into();
        assert_eq!(err.to_string(), ConnectionError::Closed.to_string());

        let err: HandlerError = FixError::from(ConnectionError::Closed).into();
        assert!(matches!(err, HandlerError::Fix(FixError::Connection(_))));

        assert_eq!(HandlerError::from("boom").to_string(), "boom");
        assert!(matches!(HandlerError::new(42), HandlerError::Failed(text) if text == "42"));
    }

    #[tokio::test]
    async fn test_noop_handlers() {
        let (ctx, _rx) = context();
        let event = SessionEvent::Logout(LogoutEvent {
            origin: LogoutOrigin::Remote,
            text: None,
        });
        assert!(NoOpAdminHandler.on_event(&ctx, &event).await.is_ok());

        let msg = Message::new("BF");
        assert!(!NoOpApplicationHandler.accepts(&msg));
        let mut out = Vec::new();
        assert!(NoOpApplicationHandler.on_message(&ctx, &msg, &mut out).await.is_ok());
        assert!(out.is_empty());
        assert!(NoOpApplicationHandler.name().ends_with("NoOpApplicationHandler"));
    }
}
