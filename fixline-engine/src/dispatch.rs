/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Category routing of session events and business messages.
//!
//! Session events go to the admin handler only. Business messages walk the
//! application chain in order: a handler that accepts a message replaces it
//! with whatever it pushes to its output buffer, a handler that does not
//! accept it passes it on untouched.

use crate::config::HandlerErrorPolicy;
use crate::handler::{AdminHandler, ApplicationHandler, HandlerContext};
use fixline_core::error::DispatchError;
use fixline_core::message::Message;
use fixline_session::SessionEvent;
use std::sync::Arc;
use tracing::{error, trace};

/// Routes one connection's inbound traffic to its handlers.
#[derive(Clone)]
pub struct Dispatcher {
    admin: Arc<dyn AdminHandler>,
    chain: Arc<[Arc<dyn ApplicationHandler>]>,
    policy: HandlerErrorPolicy,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("admin", &self.admin.name())
            .field(
                "chain",
                &self.chain.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over an admin handler and an application chain.
    #[must_use]
    pub fn new(
        admin: Arc<dyn AdminHandler>,
        chain: Arc<[Arc<dyn ApplicationHandler>]>,
        policy: HandlerErrorPolicy,
    ) -> Self {
        Self {
            admin,
            chain,
            policy,
        }
    }

    /// Delivers a session event to the admin handler.
    ///
    /// # Errors
    /// Returns `DispatchError` if the admin handler fails.
    pub async fn dispatch_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> Result<(), DispatchError> {
        trace!(event = event.kind(), "dispatching session event");
        self.admin
            .on_event(ctx, event)
            .await
            .map_err(|e| DispatchError::new(self.admin.name(), event.kind(), e.to_string()))
    }

    /// Runs a business message through the application chain.
    ///
    /// # Errors
    /// Returns `DispatchError` for the first handler that fails; the rest of
    /// the chain is skipped for this message.
    pub async fn dispatch_message(
        &self,
        ctx: &HandlerContext,
        message: Message,
    ) -> Result<(), DispatchError> {
        let mut current = vec![message];

        for handler in self.chain.iter() {
            let mut next = Vec::with_capacity(current.len());
            for msg in current {
                if !handler.accepts(&msg) {
                    next.push(msg);
                    continue;
                }
                trace!(handler = handler.name(), msg_type = %msg.msg_type(), "handler consuming message");
                handler
                    .on_message(ctx, &msg, &mut next)
                    .await
                    .map_err(|e| {
                        DispatchError::new(handler.name(), msg.msg_type().as_str(), e.to_string())
                    })?;
            }
            if next.is_empty() {
                return Ok(());
            }
            current = next;
        }

        for leftover in current {
            trace!(msg_type = %leftover.msg_type(), "message left at end of chain dropped");
        }
        Ok(())
    }

    /// Logs a failure and reports it to the admin handler.
    ///
    /// Returns true if the policy says the connection should close.
    pub async fn report(&self, ctx: &HandlerContext, err: &DispatchError) -> bool {
        error!(error = %err, "handler failed");
        self.admin.on_dispatch_error(ctx, err).await;
        self.policy == HandlerErrorPolicy::Disconnect
    }
}
