/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # fixline Core
//!
//! Core types and error definitions shared by every fixline crate.
//!
//! This crate provides:
//! - **Error types**: Connection, lifecycle, dispatch and codec errors built with `thiserror`
//! - **Messages**: [`Message`], an ordered tag/value collection with a [`MsgType`] discriminator
//! - **Fields**: Owned [`Field`] values and zero-copy [`FieldRef`] views used by the decoder
//! - **Tags**: Well-known FIX tag numbers in [`tags`]
//! - **Core types**: [`SeqNum`], [`Timestamp`], [`CompId`]

pub mod error;
pub mod field;
pub mod message;
pub mod tags;
pub mod types;

pub use error::{
    ConfigError, ConnectionError, DecodeError, DispatchError, EncodeError, FixError,
    IllegalStateError, Result, SessionError,
};
pub use field::{Field, FieldRef};
pub use message::{Message, MsgType};
pub use types::{CompId, InvalidCompId, SeqNum, Timestamp};
