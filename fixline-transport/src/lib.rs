/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixline Transport
//!
//! Network transport layer for the fixline connector.
//!
//! This crate provides:
//! - **TCP helpers**: Connect with no-delay and an optional timeout, bind an acceptor port
//! - **Codec**: Tokio codec that frames the byte stream into [`Message`](fixline_core::Message) values

pub mod codec;
pub mod tcp;

pub use codec::{CodecError, DEFAULT_MAX_MESSAGE_SIZE, FixCodec};
pub use tcp::TcpOptions;
