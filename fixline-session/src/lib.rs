/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixline Session
//!
//! FIX session layer for the fixline connector.
//!
//! This crate provides:
//! - **Settings**: [`SessionSettings`] and the [`SessionSettingsProvider`] capability,
//!   with `.properties` file and in-code implementations
//! - **Configuration**: [`SessionConfig`], the typed view used per connection
//! - **Session stage**: [`SessionStage`], the Logon/Heartbeat/Logout state machine
//! - **Events**: [`SessionEvent`] notifications for the admin handler
//! - **Heartbeat and sequence bookkeeping**

pub mod config;
pub mod events;
pub mod heartbeat;
pub mod sequence;
pub mod settings;
pub mod stage;

pub use config::{Role, SessionConfig};
pub use events::{
    HeartbeatTimeout, LogonEvent, LogoutEvent, LogoutOrigin, RejectEvent, SessionEvent,
};
pub use heartbeat::{HeartbeatDue, HeartbeatManager};
pub use sequence::SequenceManager;
pub use settings::{
    PropertySessionSettingsProvider, SessionSettings, SessionSettingsProvider,
    StaticSessionSettingsProvider,
};
pub use stage::{SessionAction, SessionStage, SessionStatus};
