/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixline
//!
//! FIX session connectors for Rust.
//!
//! fixline runs a FIX tag=value session over TCP behind a small blocking
//! lifecycle: `connect` returns once the socket is up, `disconnect` returns
//! once it is gone, and everything in between is driven by Tokio.
//!
//! ## Features
//!
//! - **Blocking lifecycle**: No runtime to set up; the connector owns its own
//! - **Split handlers**: Session events go to one admin handler, business
//!   messages through an ordered application chain
//! - **Pluggable settings**: Property files or in-code settings
//! - **Both roles**: [`engine::FixClient`] initiates, [`engine::FixServer`] accepts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixline::prelude::*;
//!
//! let mut client = FixClient::new()
//!     .with_settings(
//!         SessionSettings::new()
//!             .with("SenderCompID", "CLIENT")
//!             .with("TargetCompID", "SERVER"),
//!     )
//!     .with_application(MyApplication);
//!
//! let closed = client.connect("127.0.0.1", 9880)?;
//! closed.wait();
//! client.disconnect()?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Messages, tags, core types and error definitions
//! - [`tagvalue`]: Tag=value encoding and decoding
//! - [`session`]: Settings, session configuration and the session state machine
//! - [`transport`]: TCP helpers and the framing codec
//! - [`engine`]: Client and server connectors, handlers and dispatch

pub mod core {
    //! Messages, tags, core types and error definitions.
    pub use fixline_core::*;
}

pub mod tagvalue {
    //! Tag=value encoding and decoding.
    pub use fixline_tagvalue::*;
}

pub mod session {
    //! Settings, session configuration and the session state machine.
    pub use fixline_session::*;
}

pub mod transport {
    //! TCP helpers and the framing codec.
    pub use fixline_transport::*;
}

pub mod engine {
    //! Client and server connectors, handlers and dispatch.
    pub use fixline_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixline_core::{
        CompId, ConfigError, ConnectionError, DispatchError, FixError, IllegalStateError, Message,
        MsgType, Result, SeqNum, Timestamp, tags,
    };

    // Session
    pub use fixline_session::{
        LogonEvent, LogoutEvent, LogoutOrigin, PropertySessionSettingsProvider, RejectEvent,
        SessionEvent, SessionSettings, SessionSettingsProvider, StaticSessionSettingsProvider,
    };

    // Engine
    pub use fixline_engine::{
        AdminHandler, ApplicationHandler, CloseFuture, ConnectorConfig, FixClient, FixServer,
        HandlerContext, HandlerError, HandlerErrorPolicy, NoOpAdminHandler, NoOpApplicationHandler,
        async_trait,
    };
}
