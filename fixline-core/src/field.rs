/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field types for FIX protocol messages.
//!
//! This module provides:
//! - [`FieldRef`]: Zero-copy reference to a field within a message buffer
//! - [`Field`]: Owned tag/value pair stored inside a [`Message`](crate::Message)

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zero-copy reference to a field within a FIX message buffer.
///
/// Produced by the tag=value decoder while it walks a frame; converted into
/// an owned [`Field`] once the frame has been validated.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// The field tag number.
    pub tag: u32,
    /// Reference to the field value bytes (without delimiters).
    pub value: &'a [u8],
}

impl<'a> FieldRef<'a> {
    /// Creates a new field reference.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str, DecodeError> {
        std::str::from_utf8(self.value).map_err(DecodeError::from)
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        let s = self.as_str()?;
        s.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag: self.tag,
            reason: format!("failed to parse '{}' as {}", s, std::any::type_name::<T>()),
        })
    }

    /// Converts the reference into an owned field.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn to_owned_field(&self) -> Result<Field, DecodeError> {
        Ok(Field::new(self.tag, self.as_str()?))
    }
}

/// Owned tag/value pair.
///
/// Values are kept in their wire text form; typed access goes through
/// [`Field::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    tag: u32,
    value: String,
}

impl Field {
    /// Creates a new field.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns the tag number.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> u32 {
        self.tag
    }

    /// Returns the value text.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value text.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        self.value
            .parse()
            .map_err(|_| DecodeError::InvalidFieldValue {
                tag: self.tag,
                reason: format!(
                    "failed to parse '{}' as {}",
                    self.value,
                    std::any::type_name::<T>()
                ),
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_as_str() {
        let field = FieldRef::new(553, b"user");
        assert_eq!(field.as_str().unwrap(), "user");
    }

    #[test]
    fn test_field_ref_parse() {
        let field = FieldRef::new(34, b"12345");
        assert_eq!(field.parse::<u64>().unwrap(), 12345);

        let bad = FieldRef::new(34, b"12a");
        assert!(matches!(
            bad.parse::<u64>(),
            Err(DecodeError::InvalidFieldValue { tag: 34, .. })
        ));
    }

    #[test]
    fn test_field_ref_invalid_utf8() {
        let field = FieldRef::new(1, &[0xFF, 0xFE]);
        assert!(field.as_str().is_err());
        assert!(field.to_owned_field().is_err());
    }

    #[test]
    fn test_owned_field() {
        let mut field = FieldRef::new(926, b"1").to_owned_field().unwrap();
        assert_eq!(field.tag(), 926);
        assert_eq!(field.parse::<u8>().unwrap(), 1);

        field.set_value("2");
        assert_eq!(field.to_string(), "926=2");
    }
}
