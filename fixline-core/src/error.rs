/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the fixline connector.
//!
//! Every concern gets its own `thiserror` enum; [`FixError`] unifies them so
//! lifecycle calls can return a single error type to the caller.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixline operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Protocol violation detected by the session layer.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Establishing or using the network connection failed.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Lifecycle misuse, such as sending without an active connection.
    #[error("illegal state: {0}")]
    IllegalState(#[from] IllegalStateError),

    /// A handler failed while processing a message.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Session settings are missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixError {
    /// Returns true if this error reports lifecycle misuse.
    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }

    /// Returns true if this error reports a connection failure.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Errors that occur during FIX message decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// Invalid tag format (not a valid integer).
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// Missing required field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Message exceeds maximum allowed size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual message size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The message has an empty MsgType.
    #[error("message has no msg type")]
    MissingMsgType,

    /// A field value contains the SOH delimiter.
    #[error("field value for tag {tag} contains the SOH delimiter")]
    EmbeddedDelimiter {
        /// The tag number of the field.
        tag: u32,
    },

    /// Framing fields are managed by the encoder and cannot be set by hand.
    #[error("tag {tag} is reserved for framing")]
    ReservedTag {
        /// The reserved tag number.
        tag: u32,
    },
}

/// Protocol violations detected by the session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The first message received on a connection was not a Logon.
    #[error("first message was {msg_type}, expected logon")]
    LogonExpected {
        /// MsgType of the offending message.
        msg_type: String,
    },

    /// Logon was rejected by the counterparty or by local validation.
    #[error("logon rejected: {reason}")]
    LogonRejected {
        /// Reason for rejection.
        reason: String,
    },

    /// Logon did not complete within the configured timeout.
    #[error("logon timed out after {elapsed_ms} milliseconds")]
    LogonTimeout {
        /// Elapsed time in milliseconds.
        elapsed_ms: u64,
    },

    /// Heartbeat timeout - no response to TestRequest.
    #[error("heartbeat timeout after {elapsed_ms} milliseconds")]
    HeartbeatTimeout {
        /// Elapsed time in milliseconds since last message.
        elapsed_ms: u64,
    },
}

/// Failures establishing or using the network connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The address could not be resolved.
    #[error("failed to resolve {address}: {reason}")]
    Resolve {
        /// The address as given by the caller.
        address: String,
        /// Resolver error text.
        reason: String,
    },

    /// The connection attempt failed (refused, unreachable, reset).
    #[error("failed to connect to {address}: {reason}")]
    Connect {
        /// The remote address.
        address: String,
        /// Transport error text.
        reason: String,
    },

    /// The connection attempt did not complete in time.
    #[error("connect to {address} timed out after {timeout_ms} milliseconds")]
    Timeout {
        /// The remote address.
        address: String,
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Setting up execution resources for the connection failed.
    #[error("failed to start connection runtime: {0}")]
    Runtime(String),

    /// The connection has already been closed.
    #[error("connection closed")]
    Closed,
}

/// Lifecycle misuse of a connector.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IllegalStateError {
    /// The operation requires an active connection.
    #[error("no active connection")]
    NotConnected,

    /// `connect` was called while a connection is still held.
    #[error("already connected; call disconnect first")]
    AlreadyConnected,

    /// No session settings provider has been configured.
    #[error("no session settings provider configured")]
    MissingSettingsProvider,

    /// A blocking lifecycle call was made from inside an async runtime.
    #[error("blocking lifecycle call made from inside an async runtime")]
    BlockingInAsyncContext,
}

/// A handler failed while processing a message or event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("handler '{handler}' failed on msg type {msg_type}: {reason}")]
pub struct DispatchError {
    /// Name of the failing handler.
    pub handler: String,
    /// MsgType (or event name) being processed.
    pub msg_type: String,
    /// Error text reported by the handler.
    pub reason: String,
}

impl DispatchError {
    /// Creates a new dispatch error.
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        msg_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            handler: handler.into(),
            msg_type: msg_type.into(),
            reason: reason.into(),
        }
    }
}

/// Session settings are missing, malformed or unreadable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent.
    #[error("missing required setting: {0}")]
    MissingKey(String),

    /// A key has a value that cannot be interpreted.
    #[error("invalid value '{value}' for setting {key}: {reason}")]
    InvalidValue {
        /// The setting key.
        key: String,
        /// The offending value.
        value: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The settings resource could not be read.
    #[error("failed to read settings from {path}: {reason}")]
    Unreadable {
        /// Path of the resource.
        path: String,
        /// I/O error text.
        reason: String,
    },
}
