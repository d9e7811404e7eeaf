/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session settings and their providers.
//!
//! [`SessionSettings`] is a flat key/value map. A [`SessionSettingsProvider`]
//! produces one on demand; the connector asks for it once per connection and
//! never cares where the values came from.

use fixline_core::error::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Well-known settings keys.
pub mod keys {
    /// FIX version, e.g. `FIX.4.4`.
    pub const BEGIN_STRING: &str = "BeginString";
    /// Our CompID (tag 49 on outbound messages).
    pub const SENDER_COMP_ID: &str = "SenderCompID";
    /// Counterparty CompID (tag 56 on outbound messages).
    pub const TARGET_COMP_ID: &str = "TargetCompID";
    /// Optional SenderSubID (tag 50).
    pub const SENDER_SUB_ID: &str = "SenderSubID";
    /// Optional TargetSubID (tag 57).
    pub const TARGET_SUB_ID: &str = "TargetSubID";
    /// Optional SenderLocationID (tag 142).
    pub const SENDER_LOCATION_ID: &str = "SenderLocationID";
    /// Optional TargetLocationID (tag 143).
    pub const TARGET_LOCATION_ID: &str = "TargetLocationID";
    /// Heartbeat interval in seconds.
    pub const HEART_BT_INT: &str = "HeartBtInt";
    /// Request a sequence reset on logon.
    pub const RESET_ON_LOGON: &str = "ResetOnLogon";
    /// Seconds to wait for the logon exchange.
    pub const LOGON_TIMEOUT: &str = "LogonTimeout";
    /// Largest accepted inbound frame, in bytes.
    pub const MAX_MESSAGE_SIZE: &str = "MaxMessageSize";
    /// Validate inbound checksums.
    pub const VALIDATE_CHECKSUM: &str = "ValidateChecksum";
    /// Host used by `connect_configured`.
    pub const SOCKET_CONNECT_HOST: &str = "SocketConnectHost";
    /// Port used by `connect_configured`.
    pub const SOCKET_CONNECT_PORT: &str = "SocketConnectPort";
}

/// A flat mapping of setting names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    values: BTreeMap<String, String>,
}

impl SessionSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`SessionSettings::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the value for `key` or `ConfigError::MissingKey`.
    ///
    /// # Errors
    /// Fails if the key is absent or blank.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Parses the value for `key`, if present.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the value does not parse.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Reads a FIX-style flag (`Y`/`N`, `true`/`false`, `yes`/`no`).
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for anything else.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(Some(true)),
            "n" | "no" | "false" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                reason: "expected Y or N".to_string(),
            }),
        }
    }

    /// Returns the `SocketConnectHost`/`SocketConnectPort` pair.
    ///
    /// # Errors
    /// Fails if either key is missing or the port is not a valid number.
    pub fn socket_connect_address(&self) -> Result<(String, u16), ConfigError> {
        let host = self.require(keys::SOCKET_CONNECT_HOST)?.to_string();
        let port = self
            .parse::<u16>(keys::SOCKET_CONNECT_PORT)?
            .ok_or_else(|| ConfigError::MissingKey(keys::SOCKET_CONNECT_PORT.to_string()))?;
        Ok((host, port))
    }

    /// Iterates over all settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `.properties` text.
    ///
    /// Supports `key=value` and `key: value`, `#` and `!` comment lines,
    /// and a trailing backslash joining a value with the next line. Keys and
    /// values are trimmed; a line without a separator is a key with an empty
    /// value.
    #[must_use]
    pub fn from_properties(text: &str) -> Self {
        let mut settings = Self::new();
        let mut pending = String::new();

        for line in text.lines() {
            let line = line.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with(['#', '!'])) {
                continue;
            }

            if let Some(body) = continued(line) {
                pending.push_str(body);
                continue;
            }
            pending.push_str(line);

            let (key, value) = match pending.find(['=', ':']) {
                Some(pos) => (&pending[..pos], &pending[pos + 1..]),
                None => (pending.as_str(), ""),
            };
            let key = key.trim();
            if !key.is_empty() {
                settings.set(key, value.trim());
            }
            pending.clear();
        }

        if !pending.is_empty() {
            let (key, value) = pending.split_once(['=', ':']).unwrap_or((pending.as_str(), ""));
            if !key.trim().is_empty() {
                settings.set(key.trim(), value.trim());
            }
        }

        settings
    }
}

/// Returns the line without its continuation backslash, if it has one.
///
/// An even run of trailing backslashes is a sequence of escaped
/// backslashes, not a continuation.
fn continued(line: &str) -> Option<&str> {
    let trailing = line.bytes().rev().take_while(|&b| b == b'\\').count();
    (trailing % 2 == 1).then(|| &line[..line.len() - 1])
}

impl<K, V> FromIterator<(K, V)> for SessionSettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Self::new();
        for (key, value) in iter {
            settings.set(key, value);
        }
        settings
    }
}

/// Supplies session settings to the connector.
///
/// Called once per connection attempt, before any network activity.
pub trait SessionSettingsProvider: Send + Sync {
    /// Returns the current settings.
    ///
    /// # Errors
    /// Returns `ConfigError` if the settings cannot be produced.
    fn settings(&self) -> Result<SessionSettings, ConfigError>;
}

/// Reads settings from a `.properties` file on every call.
#[derive(Debug, Clone)]
pub struct PropertySessionSettingsProvider {
    path: PathBuf,
}

impl PropertySessionSettingsProvider {
    /// Creates a provider for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSettingsProvider for PropertySessionSettingsProvider {
    fn settings(&self) -> Result<SessionSettings, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Unreadable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(SessionSettings::from_properties(&text))
    }
}

/// Serves a fixed set of settings built in code.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionSettingsProvider {
    settings: SessionSettings,
}

impl StaticSessionSettingsProvider {
    /// Wraps `settings`.
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }
}

impl From<SessionSettings> for StaticSessionSettingsProvider {
    fn from(settings: SessionSettings) -> Self {
        Self::new(settings)
    }
}

impl SessionSettingsProvider for StaticSessionSettingsProvider {
    fn settings(&self) -> Result<SessionSettings, ConfigError> {
        Ok(self.settings.clone())
    }
}
