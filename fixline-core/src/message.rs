/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message types for FIX protocol.
//!
//! This module provides:
//! - [`MsgType`]: The message-type discriminator (tag 35)
//! - [`Message`]: An ordered tag/value collection carrying a [`MsgType`]

use crate::error::DecodeError;
use crate::field::Field;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// FIX message types known to the connector.
///
/// Session-level types drive the session stage; every other code is a
/// business message and is routed to the application handlers. Codes not
/// listed here are carried as `Custom(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Heartbeat (0) - Session level.
    Heartbeat,
    /// Test Request (1) - Session level.
    TestRequest,
    /// Resend Request (2) - Session level.
    ResendRequest,
    /// Reject (3) - Session level.
    Reject,
    /// Sequence Reset (4) - Session level.
    SequenceReset,
    /// Logout (5) - Session level.
    Logout,
    /// Logon (A) - Session level.
    Logon,
    /// Execution Report (8).
    ExecutionReport,
    /// New Order Single (D).
    NewOrderSingle,
    /// Business Message Reject (j).
    BusinessMessageReject,
    /// User Request (BE).
    UserRequest,
    /// User Response (BF).
    UserResponse,
    /// Any other message type.
    Custom(String),
}

impl FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            "8" => Self::ExecutionReport,
            "D" => Self::NewOrderSingle,
            "j" => Self::BusinessMessageReject,
            "BE" => Self::UserRequest,
            "BF" => Self::UserResponse,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl From<&str> for MsgType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(msg_type) => msg_type,
            Err(never) => match never {},
        }
    }
}

impl MsgType {
    /// Returns the wire code of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::ExecutionReport => "8",
            Self::NewOrderSingle => "D",
            Self::BusinessMessageReject => "j",
            Self::UserRequest => "BE",
            Self::UserResponse => "BF",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative (session-level) message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }

    /// Returns true if this is an application (business) message.
    #[must_use]
    pub fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A FIX message: a message type plus an ordered list of fields.
///
/// Framing fields (8, 9, 35, 10) are not stored as fields; the encoder
/// derives them. Header fields such as 49/56/34/52 are regular fields and
/// are stamped by the session layer on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    msg_type: MsgType,
    fields: SmallVec<[Field; 16]>,
}

impl Message {
    /// Creates an empty message of the given type.
    ///
    /// # Example
    /// ```
    /// use fixline_core::{Message, MsgType, tags};
    ///
    /// let msg = Message::new("BE")
    ///     .with(tags::USER_REQUEST_ID, "UserRequestID")
    ///     .with(tags::USER_REQUEST_TYPE, 4);
    /// assert_eq!(msg.msg_type(), &MsgType::UserRequest);
    /// assert_eq!(msg.get(tags::USER_REQUEST_TYPE), Some("4"));
    /// ```
    #[must_use]
    pub fn new(msg_type: impl Into<MsgType>) -> Self {
        Self {
            msg_type: msg_type.into(),
            fields: SmallVec::new(),
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns true if this is a session-level message.
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.msg_type.is_admin()
    }

    /// Appends a field, keeping any existing field with the same tag.
    pub fn add(&mut self, tag: u32, value: impl fmt::Display) -> &mut Self {
        self.fields.push(Field::new(tag, value.to_string()));
        self
    }

    /// Builder-style [`Message::add`].
    #[must_use]
    pub fn with(mut self, tag: u32, value: impl fmt::Display) -> Self {
        self.add(tag, value);
        self
    }

    /// Sets the first field with `tag`, appending it if absent.
    pub fn set(&mut self, tag: u32, value: impl fmt::Display) -> &mut Self {
        let value = value.to_string();
        match self.fields.iter_mut().find(|f| f.tag() == tag) {
            Some(field) => field.set_value(value),
            None => self.fields.push(Field::new(tag, value)),
        }
        self
    }

    /// Removes every field with `tag`, returning how many were removed.
    pub fn remove(&mut self, tag: u32) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| f.tag() != tag);
        before - self.fields.len()
    }

    /// Appends an already-built field.
    pub fn push_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Returns the value of the first field with `tag`.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag() == tag)
            .map(Field::value)
    }

    /// Parses the value of the first field with `tag`.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingRequiredField` if the tag is absent, or
    /// `DecodeError::InvalidFieldValue` if it cannot be parsed.
    pub fn get_as<T: FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        self.fields
            .iter()
            .find(|f| f.tag() == tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?
            .parse()
    }

    /// Returns true if a field with `tag` is present.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag() == tag)
    }

    /// Returns the fields in insertion (or wire) order.
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the message carries no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Message {
    /// Renders the message with `|` in place of SOH, for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "35={}|", self.msg_type)?;
        for field in &self.fields {
            write!(f, "{}|", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_msg_type_round_trip() {
        assert_eq!(MsgType::from("A"), MsgType::Logon);
        assert_eq!(MsgType::from("BF"), MsgType::UserResponse);
        assert_eq!(MsgType::UserRequest.as_str(), "BE");
    }

    #[test]
    fn test_msg_type_is_admin() {
        assert!(MsgType::Heartbeat.is_admin());
        assert!(MsgType::Logon.is_admin());
        assert!(MsgType::Logout.is_admin());
        assert!(!MsgType::UserRequest.is_admin());
        assert!(MsgType::from("XX").is_app());
    }

    #[test]
    fn test_msg_type_custom() {
        let custom = MsgType::from("XX");
        assert!(matches!(custom, MsgType::Custom(_)));
        assert_eq!(custom.as_str(), "XX");
    }

    #[test]
    fn test_message_field_access() {
        let msg = Message::new(MsgType::UserResponse)
            .with(tags::USER_REQUEST_ID, "UserRequestID")
            .with(tags::USERNAME, "user")
            .with(tags::USER_STATUS, 1)
            .with(tags::USER_STATUS_TEXT, "Active");

        assert_eq!(msg.len(), 4);
        assert_eq!(msg.get(tags::USERNAME), Some("user"));
        assert_eq!(msg.get_as::<u8>(tags::USER_STATUS).unwrap(), 1);
        assert!(matches!(
            msg.get_as::<u8>(tags::TEXT),
            Err(DecodeError::MissingRequiredField { tag: 58 })
        ));
    }

    #[test]
    fn test_message_set_replaces_first() {
        let mut msg = Message::new("D");
        msg.add(tags::MSG_SEQ_NUM, 1);
        msg.set(tags::MSG_SEQ_NUM, 7);
        msg.set(tags::SENDER_COMP_ID, "CLIENT");

        assert_eq!(msg.get(tags::MSG_SEQ_NUM), Some("7"));
        assert_eq!(msg.get(tags::SENDER_COMP_ID), Some("CLIENT"));
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_message_remove() {
        let mut msg = Message::new("D").with(58, "a").with(58, "b").with(11, "X");
        assert_eq!(msg.remove(58), 2);
        assert!(!msg.contains(58));
        assert!(msg.contains(11));
    }

    #[test]
    fn test_message_display() {
        let msg = Message::new("BE").with(tags::USERNAME, "user");
        assert_eq!(msg.to_string(), "35=BE|553=user|");
    }

    #[test]
    fn test_message_keeps_order_beyond_inline_capacity() {
        let mut msg = Message::new("BF");
        for tag in 5000..5040 {
            msg.add(tag, tag * 2);
        }

        assert_eq!(msg.len(), 40);
        let tags: Vec<u32> = msg.fields().map(|f| f.tag()).collect();
        assert_eq!(tags, (5000..5040).collect::<Vec<_>>());
        assert_eq!(msg.get(5039), Some("10078"));

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Message>();
    }
}
