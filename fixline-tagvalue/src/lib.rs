/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixline Tag-Value
//!
//! FIX tag=value encoding and decoding for the fixline connector.
//!
//! The encoder turns a [`Message`](fixline_core::Message) into a complete
//! frame (BeginString, BodyLength, CheckSum added automatically); the decoder
//! walks a complete frame with `memchr` and produces an owned message.

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::calculate_checksum;
pub use decoder::{Decoder, SOH, decode_message};
pub use encoder::{Encoder, encode_message};
