/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! Frames are delimited by BodyLength (tag 9) and terminated by the
//! `10=XXX<SOH>` trailer. Complete frames are decoded into owned
//! [`Message`] values; outbound messages are encoded with the configured
//! BeginString.

use bytes::{BufMut, BytesMut};
use fixline_core::error::{DecodeError, EncodeError};
use fixline_core::message::Message;
use fixline_tagvalue::{SOH, decode_message, encode_message};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Default maximum frame size: 1 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Length of the `10=XXX<SOH>` trailer.
const TRAILER_LEN: usize = 7;

/// Errors that can occur during codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Inbound frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Outbound message could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// I/O error on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tokio codec for FIX message framing.
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// BeginString written on outbound frames.
    begin_string: String,
    /// Maximum frame size in bytes.
    max_message_size: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a codec writing the given BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            begin_string: begin_string.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Returns the BeginString written on outbound frames.
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// Returns the length of the first complete frame in `src`, if any.
    fn frame_len(&self, src: &[u8]) -> Result<Option<usize>, DecodeError> {
        if src.len() >= 2 && &src[..2] != b"8=" {
            return Err(DecodeError::InvalidBeginString);
        }

        let Some(first_soh) = memchr(SOH, src) else {
            if src.len() > self.max_message_size {
                return Err(DecodeError::MessageTooLarge {
                    size: src.len(),
                    max_size: self.max_message_size,
                });
            }
            return Ok(None);
        };

        let body_len_start = first_soh + 1;
        if src.len() < body_len_start + 2 {
            return Ok(None);
        }
        if &src[body_len_start..body_len_start + 2] != b"9=" {
            return Err(DecodeError::MissingBodyLength);
        }

        let Some(body_len_soh) = memchr(SOH, &src[body_len_start..]) else {
            return Ok(None);
        };
        let body_len_soh = body_len_start + body_len_soh;

        let body_length: usize = std::str::from_utf8(&src[body_len_start + 2..body_len_soh])
            .map_err(|_| DecodeError::InvalidBodyLength)?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;

        let total = (body_len_soh + 1 + TRAILER_LEN)
            .checked_add(body_length)
            .ok_or(DecodeError::InvalidBodyLength)?;
        if total > self.max_message_size {
            return Err(DecodeError::MessageTooLarge {
                size: total,
                max_size: self.max_message_size,
            });
        }

        Ok((src.len() >= total).then_some(total))
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new("FIX.4.4")
    }
}

impl Decoder for FixCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(total) = self.frame_len(src)? else {
            return Ok(None);
        };

        let frame = src.split_to(total);
        Ok(Some(decode_message(&frame, self.validate_checksum)?))
    }
}

impl Encoder<Message> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = encode_message(&self.begin_string, &item)?;
        dst.reserve(frame.len());
        dst.put_slice(&frame);
        Ok(())
    }
}
