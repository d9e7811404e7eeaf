/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session-level notifications for the admin handler.

use fixline_core::message::Message;
use fixline_core::types::{CompId, SeqNum};
use std::fmt;
use std::time::Duration;

/// A session-level event. Never a business message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The logon exchange completed.
    Logon(LogonEvent),
    /// The session was logged out.
    Logout(LogoutEvent),
    /// A TestRequest went unanswered.
    HeartbeatTimeout(HeartbeatTimeout),
    /// The counterparty rejected one of our messages.
    Reject(RejectEvent),
}

impl SessionEvent {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Logon(_) => "logon",
            Self::Logout(_) => "logout",
            Self::HeartbeatTimeout(_) => "heartbeat_timeout",
            Self::Reject(_) => "reject",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logon(e) => write!(f, "logon {}->{}", e.sender_comp_id, e.target_comp_id),
            Self::Logout(e) => write!(f, "logout ({:?})", e.origin),
            Self::HeartbeatTimeout(e) => write!(f, "heartbeat timeout after {:?}", e.silence),
            Self::Reject(e) => write!(f, "reject of seq {:?}", e.ref_seq_num.map(SeqNum::value)),
        }
    }
}

/// Details of a completed logon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogonEvent {
    /// Our CompID.
    pub sender_comp_id: CompId,
    /// The counterparty's CompID.
    pub target_comp_id: CompId,
    /// Negotiated heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Whether the logon requested a sequence reset.
    pub reset_seq_num: bool,
}

/// Which side ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOrigin {
    /// We sent the first Logout.
    Local,
    /// The counterparty sent the first Logout.
    Remote,
}

/// Details of a logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutEvent {
    /// Who started the logout.
    pub origin: LogoutOrigin,
    /// Text (58) carried by the counterparty's Logout, if any.
    pub text: Option<String>,
}

/// Details of a heartbeat timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatTimeout {
    /// Time since the counterparty was last heard from.
    pub silence: Duration,
}

/// A session-level Reject (35=3) received from the counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectEvent {
    /// RefSeqNum (45).
    pub ref_seq_num: Option<SeqNum>,
    /// SessionRejectReason (373).
    pub reason: Option<u32>,
    /// Text (58).
    pub text: Option<String>,
    /// The full Reject message.
    pub message: Message,
}
