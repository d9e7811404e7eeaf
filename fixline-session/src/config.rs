/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.
//!
//! [`SessionConfig`] is the typed view of [`SessionSettings`] used by the
//! session stage. It is built once per connection and is read-only after.

use crate::settings::{SessionSettings, keys};
use fixline_core::error::ConfigError;
use fixline_core::types::{CompId, InvalidCompId};
use std::time::Duration;

/// Which side of the logon exchange a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Opens the connection and sends the first Logon.
    Initiator,
    /// Accepts the connection and answers the counterparty's Logon.
    Acceptor,
}

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56). `None` lets an acceptor adopt the
    /// counterparty's SenderCompID at logon.
    pub target_comp_id: Option<CompId>,
    /// FIX version BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Whether to request a sequence reset on logon.
    pub reset_on_logon: bool,
    /// Maximum inbound frame size in bytes.
    pub max_message_size: usize,
    /// Logon timeout duration.
    pub logon_timeout: Duration,
    /// Extra silence tolerated before a TestRequest is sent. Not read from
    /// settings.
    pub test_request_grace: Duration,
    /// Whether to validate incoming message checksums.
    pub validate_checksum: bool,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional target location ID (tag 143).
    pub target_location_id: Option<String>,
}

impl SessionConfig {
    /// Creates a new session configuration with required fields.
    #[must_use]
    pub fn new(
        sender_comp_id: CompId,
        target_comp_id: CompId,
        begin_string: impl Into<String>,
    ) -> Self {
        let mut config = Self::accepting_any(sender_comp_id, begin_string);
        config.target_comp_id = Some(target_comp_id);
        config
    }

    /// Creates an acceptor configuration that takes the target CompID from
    /// the counterparty's Logon.
    #[must_use]
    pub fn accepting_any(sender_comp_id: CompId, begin_string: impl Into<String>) -> Self {
        Self {
            sender_comp_id,
            target_comp_id: None,
            begin_string: begin_string.into(),
            heartbeat_interval: Duration::from_secs(30),
            reset_on_logon: false,
            max_message_size: 1024 * 1024,
            logon_timeout: Duration::from_secs(10),
            test_request_grace: Duration::from_secs(1),
            validate_checksum: true,
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Builds a configuration from settings.
    ///
    /// `SenderCompID` is always required; `TargetCompID` is required for
    /// initiators and optional for acceptors.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing required keys or unparsable values.
    pub fn from_settings(settings: &SessionSettings, role: Role) -> Result<Self, ConfigError> {
        let sender = comp_id(settings, keys::SENDER_COMP_ID)?
            .ok_or_else(|| ConfigError::MissingKey(keys::SENDER_COMP_ID.to_string()))?;
        let target = comp_id(settings, keys::TARGET_COMP_ID)?;
        if target.is_none() && role == Role::Initiator {
            return Err(ConfigError::MissingKey(keys::TARGET_COMP_ID.to_string()));
        }

        let begin_string = settings.get(keys::BEGIN_STRING).unwrap_or("FIX.4.4");
        if !begin_string.starts_with("FIX") {
            return Err(ConfigError::InvalidValue {
                key: keys::BEGIN_STRING.to_string(),
                value: begin_string.to_string(),
                reason: "expected FIX.x.y or FIXT.x.y".to_string(),
            });
        }

        let mut config = Self::accepting_any(sender, begin_string);
        config.target_comp_id = target;

        if let Some(secs) = settings.parse::<u64>(keys::HEART_BT_INT)? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: keys::HEART_BT_INT.to_string(),
                    value: secs.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.heartbeat_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.parse::<u64>(keys::LOGON_TIMEOUT)? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: keys::LOGON_TIMEOUT.to_string(),
                    value: secs.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.logon_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = settings.parse::<usize>(keys::MAX_MESSAGE_SIZE)? {
            config.max_message_size = size;
        }
        if let Some(reset) = settings.flag(keys::RESET_ON_LOGON)? {
            config.reset_on_logon = reset;
        }
        if let Some(validate) = settings.flag(keys::VALIDATE_CHECKSUM)? {
            config.validate_checksum = validate;
        }

        config.sender_sub_id = optional(settings, keys::SENDER_SUB_ID);
        config.target_sub_id = optional(settings, keys::TARGET_SUB_ID);
        config.sender_location_id = optional(settings, keys::SENDER_LOCATION_ID);
        config.target_location_id = optional(settings, keys::TARGET_LOCATION_ID);

        Ok(config)
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets whether to reset sequence numbers on logon.
    #[must_use]
    pub const fn with_reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the TestRequest grace period.
    #[must_use]
    pub fn with_test_request_grace(mut self, grace: Duration) -> Self {
        self.test_request_grace = grace;
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Returns the heartbeat interval in whole seconds, as sent in tag 108.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }
}

fn comp_id(settings: &SessionSettings, key: &str) -> Result<Option<CompId>, ConfigError> {
    match settings.get(key).map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: InvalidCompId| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn optional(settings: &SessionSettings, key: &str) -> Option<String> {
    settings
        .get(key)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_settings() -> SessionSettings {
        SessionSettings::new()
            .with(keys::SENDER_COMP_ID, "CLIENT")
            .with(keys::TARGET_COMP_ID, "SERVER")
    }

    #[test]
    fn test_session_config_new() {
        let sender = CompId::new("SENDER").unwrap();
        let target = CompId::new("TARGET").unwrap();
        let config = SessionConfig::new(sender, target, "FIX.4.4");

        assert_eq!(config.sender_comp_id.as_str(), "SENDER");
        assert_eq!(config.target_comp_id.unwrap().as_str(), "TARGET");
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_from_settings_defaults() {
        let config = SessionConfig::from_settings(&client_settings(), Role::Initiator).unwrap();
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval_secs(), 30);
        assert_eq!(config.logon_timeout, Duration::from_secs(10));
        assert_eq!(config.max_message_size, 1_048_576);
        assert!(!config.reset_on_logon);
        assert!(config.validate_checksum);
        assert!(config.sender_sub_id.is_none());
    }

    #[test]
    fn test_from_settings_overrides() {
        let settings = client_settings()
            .with(keys::BEGIN_STRING, "FIX.4.2")
            .with(keys::HEART_BT_INT, "5")
            .with(keys::RESET_ON_LOGON, "Y")
            .with(keys::VALIDATE_CHECKSUM, "N")
            .with(keys::SENDER_SUB_ID, "DESK1");

        let config = SessionConfig::from_settings(&settings, Role::Initiator).unwrap();
        assert_eq!(config.begin_string, "FIX.4.2");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert!(config.reset_on_logon);
        assert!(!config.validate_checksum);
        assert_eq!(config.sender_sub_id.as_deref(), Some("DESK1"));
    }

    #[test]
    fn test_from_settings_missing_ids() {
        let only_sender = SessionSettings::new().with(keys::SENDER_COMP_ID, "SERVER");

        assert_eq!(
            SessionConfig::from_settings(&only_sender, Role::Initiator).unwrap_err(),
            ConfigError::MissingKey("TargetCompID".to_string())
        );
        let acceptor = SessionConfig::from_settings(&only_sender, Role::Acceptor).unwrap();
        assert!(acceptor.target_comp_id.is_none());

        assert_eq!(
            SessionConfig::from_settings(&SessionSettings::new(), Role::Acceptor).unwrap_err(),
            ConfigError::MissingKey("SenderCompID".to_string())
        );
    }

    #[test]
    fn test_from_settings_invalid_values() {
        let zero_heartbeat = client_settings().with(keys::HEART_BT_INT, "0");
        assert!(matches!(
            SessionConfig::from_settings(&zero_heartbeat, Role::Initiator),
            Err(ConfigError::InvalidValue { .. })
        ));

        let zero_logon_timeout = client_settings().with(keys::LOGON_TIMEOUT, "0");
        assert_eq!(
            SessionConfig::from_settings(&zero_logon_timeout, Role::Initiator).unwrap_err(),
            ConfigError::InvalidValue {
                key: "LogonTimeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            }
        );

        let long_id = client_settings().with(keys::TARGET_COMP_ID, "X".repeat(40));
        assert!(matches!(
            SessionConfig::from_settings(&long_id, Role::Initiator),
            Err(ConfigError::InvalidValue { ref reason, .. }) if reason.contains("got 40")
        ));

        let bad_version = client_settings().with(keys::BEGIN_STRING, "4.4");
        assert!(SessionConfig::from_settings(&bad_version, Role::Initiator).is_err());
    }
}
