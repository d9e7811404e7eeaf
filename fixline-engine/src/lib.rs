/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixline Engine
//!
//! Connectors that run FIX sessions over TCP behind a blocking lifecycle.
//!
//! This crate provides:
//! - **Initiator**: [`FixClient`], one outbound connection at a time
//! - **Acceptor**: [`FixServer`], one pipeline per accepted connection
//! - **Handlers**: [`AdminHandler`] for session events and
//!   [`ApplicationHandler`] chains for business messages
//! - **Pipeline**: [`PipelineInitializer`] wiring codec, session stage and
//!   dispatcher onto a socket
//! - **Close latch**: [`CloseFuture`], waitable from threads or async code

pub mod client;
pub mod close;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod pipeline;
mod runtime;
pub mod server;

pub use client::FixClient;
pub use close::CloseFuture;
pub use config::{ConnectorConfig, HandlerErrorPolicy};
pub use dispatch::Dispatcher;
pub use handler::{
    AdminHandler, ApplicationHandler, HandlerContext, HandlerError, NoOpAdminHandler,
    NoOpApplicationHandler,
};
pub use pipeline::{Connection, PipelineInitializer};
pub use server::FixServer;

pub use async_trait::async_trait;
