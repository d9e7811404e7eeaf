/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! [`Encoder`] appends raw tag=value fields and frames them; [`encode_message`]
//! lays out a [`Message`] (MsgType, header fields, body) and runs it through
//! an encoder.

use crate::checksum::{calculate_checksum, format_checksum};
use crate::decoder::SOH;
use bytes::{BufMut, BytesMut};
use fixline_core::error::EncodeError;
use fixline_core::message::Message;
use fixline_core::tags;

/// FIX message encoder.
///
/// Builds the body field by field and adds BeginString, BodyLength and
/// CheckSum in [`Encoder::finish`].
#[derive(Debug)]
pub struct Encoder {
    /// Buffer for the message body (between BodyLength and Checksum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
}

impl Encoder {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self::with_capacity(begin_string, 256)
    }

    /// Creates a new encoder with pre-allocated body capacity.
    #[must_use]
    pub fn with_capacity(begin_string: impl Into<String>, capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            begin_string: begin_string.into(),
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Finalizes the message: prepends `8=` and `9=`, appends `10=`.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let body_len = self.body.len();
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(body_len);

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + body_len + 16);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&message));
        message.put_slice(b"10=");
        message.put_slice(&checksum);
        message.put_u8(SOH);

        message
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Encodes a message into a complete tag=value frame.
///
/// MsgType comes first, then the standard header fields in
/// [`tags::HEADER_ORDER`], then all remaining fields in insertion order.
///
/// # Errors
/// Returns `EncodeError` if the message type is empty, a value contains SOH,
/// or a framing tag (8, 9, 10, 35) was set as a regular field.
pub fn encode_message(begin_string: &str, message: &Message) -> Result<BytesMut, EncodeError> {
    let msg_type = message.msg_type().as_str();
    if msg_type.is_empty() {
        return Err(EncodeError::MissingMsgType);
    }

    let mut encoder = Encoder::new(begin_string);
    encoder.put_str(tags::MSG_TYPE, msg_type);

    for tag in tags::HEADER_ORDER {
        for field in message.fields().filter(|f| f.tag() == tag) {
            check_value(field.tag(), field.value())?;
            encoder.put_str(field.tag(), field.value());
        }
    }

    for field in message.fields().filter(|f| !tags::is_header(f.tag())) {
        if tags::is_framing(field.tag()) {
            return Err(EncodeError::ReservedTag { tag: field.tag() });
        }
        check_value(field.tag(), field.value())?;
        encoder.put_str(field.tag(), field.value());
    }

    Ok(encoder.finish())
}

fn check_value(tag: u32, value: &str) -> Result<(), EncodeError> {
    if value.as_bytes().contains(&SOH) {
        return Err(EncodeError::EmbeddedDelimiter { tag });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_basic() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");

        let message = encoder.finish();
        assert_eq!(&message[..], b"8=FIX.4.4\x019=5\x0135=0\x0110=163\x01");
    }

    #[test]
    fn test_encoder_uint() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_uint(34, 12);
        assert_eq!(encoder.body_len(), 6);

        let msg_str = String::from_utf8_lossy(&encoder.finish()).into_owned();
        assert!(msg_str.contains("34=12\x01"));
    }

    #[test]
    fn test_encode_message_orders_header_first() {
        let msg = Message::new("BE")
            .with(tags::USERNAME, "user")
            .with(tags::MSG_SEQ_NUM, 2)
            .with(tags::SENDER_COMP_ID, "CLIENT");

        let bytes = encode_message("FIX.4.4", &msg).unwrap();
        let msg_str = String::from_utf8_lossy(&bytes).into_owned();
        let body = msg_str.split_once("35=").unwrap().1;
        assert!(body.starts_with("BE\x0149=CLIENT\x0134=2\x01553=user\x01"));
    }

    #[test]
    fn test_encode_message_rejects_framing_tag() {
        let msg = Message::new("BE").with(tags::CHECK_SUM, "000");
        assert_eq!(
            encode_message("FIX.4.4", &msg),
            Err(EncodeError::ReservedTag { tag: 10 })
        );
    }

    #[test]
    fn test_encode_message_rejects_soh() {
        let msg = Message::new("BE").with(tags::TEXT, "a\x01b");
        assert_eq!(
            encode_message("FIX.4.4", &msg),
            Err(EncodeError::EmbeddedDelimiter { tag: 58 })
        );
    }

    #[test]
    fn test_encode_message_rejects_empty_type() {
        let msg = Message::new("");
        assert_eq!(
            encode_message("FIX.4.4", &msg),
            Err(EncodeError::MissingMsgType)
        );
    }
}
