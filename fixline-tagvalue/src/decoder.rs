/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message decoder.
//!
//! [`Decoder`] walks a complete frame field by field without copying;
//! [`decode_message`] validates the framing fields and builds an owned
//! [`Message`] from the body.

use crate::checksum::{calculate_checksum, parse_checksum};
use fixline_core::error::DecodeError;
use fixline_core::field::FieldRef;
use fixline_core::message::{Message, MsgType};
use fixline_core::tags;
use memchr::memchr;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Zero-copy field iterator over a FIX frame.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes one complete frame into a [`Message`].
    ///
    /// BeginString, BodyLength, MsgType and CheckSum are validated and not
    /// stored as fields; everything else is kept in wire order.
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is malformed or incomplete.
    pub fn decode(&mut self) -> Result<Message, DecodeError> {
        let start = self.offset;

        let begin_string = self.next_field().ok_or(DecodeError::Incomplete)?;
        if begin_string.tag != tags::BEGIN_STRING || !begin_string.value.starts_with(b"FIX") {
            return Err(DecodeError::InvalidBeginString);
        }

        let body_length = self.next_field().ok_or(DecodeError::MissingBodyLength)?;
        if body_length.tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        let body_length: usize = body_length
            .as_str()?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        let body_start = self.offset;

        let msg_type = self.next_field().ok_or(DecodeError::MissingMsgType)?;
        if msg_type.tag != tags::MSG_TYPE || msg_type.value.is_empty() {
            return Err(DecodeError::MissingMsgType);
        }
        let mut message = Message::new(MsgType::from(msg_type.as_str()?));

        let mut checksum: Option<FieldRef<'a>> = None;
        let mut checksum_offset = self.offset;
        while let Some(field) = self.next_field() {
            if field.tag == tags::CHECK_SUM {
                checksum = Some(field);
                break;
            }
            message.push_field(field.to_owned_field()?);
            checksum_offset = self.offset;
        }
        let checksum = checksum.ok_or(DecodeError::Incomplete)?;

        if checksum_offset - body_start != body_length {
            return Err(DecodeError::InvalidBodyLength);
        }

        if self.validate_checksum {
            let declared =
                parse_checksum(checksum.value).ok_or_else(|| DecodeError::InvalidFieldValue {
                    tag: tags::CHECK_SUM,
                    reason: "invalid checksum format".to_string(),
                })?;
            let calculated = calculate_checksum(&self.input[start..checksum_offset]);
            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(message)
    }

    /// Parses the next field from the buffer.
    ///
    /// Returns `None` when the buffer is exhausted or the next field is
    /// not terminated.
    #[inline]
    pub fn next_field(&mut self) -> Option<FieldRef<'a>> {
        let remaining = self.input.get(self.offset..)?;
        if remaining.is_empty() {
            return None;
        }

        let eq_pos = memchr(EQUALS, remaining)?;
        let tag = parse_tag(&remaining[..eq_pos])?;

        let value_start = eq_pos + 1;
        let soh_pos = memchr(SOH, &remaining[value_start..])?;
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset += value_start + soh_pos + 1;
        Some(FieldRef::new(tag, value))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }
}

/// Decodes a complete frame into a [`Message`].
///
/// # Errors
/// Returns `DecodeError` if the frame is malformed.
pub fn decode_message(frame: &[u8], validate_checksum: bool) -> Result<Message, DecodeError> {
    Decoder::new(frame)
        .with_checksum_validation(validate_checksum)
        .decode()
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    bytes.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_message;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"35"), Some(35));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"12a"), None);
        assert_eq!(parse_tag(b"99999999999"), None);
    }

    #[test]
    fn test_next_field() {
        let mut decoder = Decoder::new(b"8=FIX.4.4\x019=5\x0135=0\x01");

        let field = decoder.next_field().unwrap();
        assert_eq!((field.tag, field.as_str().unwrap()), (8, "FIX.4.4"));
        let field = decoder.next_field().unwrap();
        assert_eq!((field.tag, field.as_str().unwrap()), (9, "5"));
        let field = decoder.next_field().unwrap();
        assert_eq!((field.tag, field.as_str().unwrap()), (35, "0"));

        assert!(decoder.next_field().is_none());
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_decode_heartbeat() {
        let msg = decode_message(b"8=FIX.4.4\x019=5\x0135=0\x0110=163\x01", true).unwrap();
        assert_eq!(msg.msg_type(), &MsgType::Heartbeat);
        assert!(msg.is_empty());
    }

    #[test]
    fn test_decode_encoded_user_response() {
        let original = Message::new("BF")
            .with(tags::SENDER_COMP_ID, "SERVER")
            .with(tags::USER_REQUEST_ID, "UserRequestID")
            .with(tags::USER_STATUS, 1);
        let frame = encode_message("FIX.4.4", &original).unwrap();

        let decoded = decode_message(&frame, true).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let result = decode_message(b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01", true);
        assert!(matches!(result, Err(DecodeError::ChecksumMismatch { .. })));

        let lenient = decode_message(b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01", false);
        assert!(lenient.is_ok());
    }

    #[test]
    fn test_decode_wrong_body_length() {
        let result = decode_message(b"8=FIX.4.4\x019=9\x0135=0\x0110=167\x01", false);
        assert_eq!(result, Err(DecodeError::InvalidBodyLength));
    }

    #[test]
    fn test_decode_missing_msg_type() {
        let result = decode_message(b"8=FIX.4.4\x019=6\x0149=AB\x0110=000\x01", false);
        assert_eq!(result, Err(DecodeError::MissingMsgType));
    }

    #[test]
    fn test_decode_incomplete() {
        assert_eq!(
            decode_message(b"8=FIX.4.4", true),
            Err(DecodeError::Incomplete)
        );
    }
}
