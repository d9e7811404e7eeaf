/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Session-state stage.
//!
//! [`SessionStage`] is a transport-agnostic state machine. It consumes
//! inbound messages, timer ticks and local close requests and answers with
//! a list of [`SessionAction`]s for the connection driver to carry out in
//! order. It never touches the network itself.

use crate::config::{Role, SessionConfig};
use crate::events::{
    HeartbeatTimeout, LogonEvent, LogoutEvent, LogoutOrigin, RejectEvent, SessionEvent,
};
use crate::heartbeat::{HeartbeatDue, HeartbeatManager};
use crate::sequence::SequenceManager;
use fixline_core::error::SessionError;
use fixline_core::message::{Message, MsgType};
use fixline_core::tags;
use fixline_core::types::{CompId, SeqNum, Timestamp};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Something the connection driver must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Stamp and write this message.
    Send(Message),
    /// Hand this business message to the application chain.
    Deliver(Message),
    /// Notify the admin handler.
    Event(SessionEvent),
    /// Flush pending writes and close the connection.
    Disconnect,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Connected, Logon not yet exchanged.
    AwaitingLogon,
    /// Logged on; business messages flow.
    Active,
    /// Logged out or refused; nothing more is processed.
    Closed,
}

/// Per-connection session state machine.
#[derive(Debug)]
pub struct SessionStage {
    role: Role,
    config: SessionConfig,
    target: Option<CompId>,
    status: SessionStatus,
    sequence: SequenceManager,
    heartbeat: HeartbeatManager,
    started_at: Instant,
}

impl SessionStage {
    /// Creates a stage for one connection.
    #[must_use]
    pub fn new(role: Role, config: SessionConfig) -> Self {
        let heartbeat = HeartbeatManager::new(config.heartbeat_interval)
            .with_grace(config.test_request_grace);
        Self {
            role,
            target: config.target_comp_id.clone(),
            config,
            status: SessionStatus::AwaitingLogon,
            sequence: SequenceManager::new(),
            heartbeat,
            started_at: Instant::now(),
        }
    }

    /// Returns the session role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true once the Logon exchange has completed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Returns the counterparty CompID, once known.
    #[must_use]
    pub fn target_comp_id(&self) -> Option<&CompId> {
        self.target.as_ref()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the MsgSeqNum the next outbound message will carry.
    #[must_use]
    pub fn next_outbound_seq(&self) -> SeqNum {
        self.sequence.next_outbound()
    }

    /// Starts the session once the connection is up.
    ///
    /// An initiator sends its Logon; an acceptor waits.
    pub fn start(&mut self) -> Vec<SessionAction> {
        self.started_at = Instant::now();
        self.heartbeat.reset();

        match self.role {
            Role::Initiator => {
                let reset = self.config.reset_on_logon;
                if reset {
                    self.sequence.reset();
                }
                debug!(reset, "sending logon");
                vec![SessionAction::Send(self.logon_message(reset))]
            }
            Role::Acceptor => Vec::new(),
        }
    }

    /// Processes one inbound message.
    pub fn on_message(&mut self, message: Message) -> Vec<SessionAction> {
        self.heartbeat.on_message_received();
        self.sequence.observe_inbound(
            message
                .get_as::<u64>(tags::MSG_SEQ_NUM)
                .ok()
                .map(SeqNum::new),
        );

        match self.status {
            SessionStatus::Closed => {
                trace!(msg_type = %message.msg_type(), "message after close dropped");
                Vec::new()
            }
            SessionStatus::AwaitingLogon if *message.msg_type() == MsgType::Logon => {
                self.on_logon(&message)
            }
            SessionStatus::AwaitingLogon => {
                let err = SessionError::LogonExpected {
                    msg_type: message.msg_type().to_string(),
                };
                self.refuse(err)
            }
            SessionStatus::Active => self.on_active_message(message),
        }
    }

    /// Evaluates timers. Call periodically.
    pub fn on_tick(&mut self) -> Vec<SessionAction> {
        match self.status {
            SessionStatus::AwaitingLogon => {
                let elapsed = self.started_at.elapsed();
                if elapsed < self.config.logon_timeout {
                    return Vec::new();
                }
                let err = SessionError::LogonTimeout {
                    elapsed_ms: millis(elapsed),
                };
                warn!(error = %err, "logon not completed");
                self.status = SessionStatus::Closed;
                vec![SessionAction::Disconnect]
            }
            SessionStatus::Active => match self.heartbeat.poll() {
                HeartbeatDue::Idle => Vec::new(),
                HeartbeatDue::Heartbeat => {
                    trace!("sending heartbeat");
                    vec![SessionAction::Send(Message::new(MsgType::Heartbeat))]
                }
                HeartbeatDue::TestRequest => {
                    let id = self.heartbeat.begin_test_request();
                    debug!(test_req_id = %id, "counterparty silent, sending test request");
                    vec![SessionAction::Send(
                        Message::new(MsgType::TestRequest).with(tags::TEST_REQ_ID, id),
                    )]
                }
                HeartbeatDue::TimedOut { silence } => {
                    let err = SessionError::HeartbeatTimeout {
                        elapsed_ms: millis(silence),
                    };
                    warn!(error = %err, "counterparty unresponsive");
                    self.status = SessionStatus::Closed;
                    vec![
                        SessionAction::Event(SessionEvent::HeartbeatTimeout(HeartbeatTimeout {
                            silence,
                        })),
                        SessionAction::Disconnect,
                    ]
                }
            },
            SessionStatus::Closed => Vec::new(),
        }
    }

    /// Handles a local request to close the connection.
    ///
    /// A logged-on session says goodbye with a Logout first.
    pub fn on_close_request(&mut self) -> Vec<SessionAction> {
        let was_active = self.is_active();
        self.status = SessionStatus::Closed;

        if !was_active {
            return vec![SessionAction::Disconnect];
        }
        info!("logging out");
        vec![
            SessionAction::Send(Message::new(MsgType::Logout)),
            SessionAction::Event(SessionEvent::Logout(LogoutEvent {
                origin: LogoutOrigin::Local,
                text: None,
            })),
            SessionAction::Disconnect,
        ]
    }

    /// Stamps the standard header on an outbound message.
    ///
    /// Sets SenderCompID, TargetCompID (once known), the optional sub and
    /// location IDs, the next MsgSeqNum and SendingTime.
    pub fn prepare_outbound(&mut self, mut message: Message) -> Message {
        message.set(tags::SENDER_COMP_ID, &self.config.sender_comp_id);
        if let Some(target) = &self.target {
            message.set(tags::TARGET_COMP_ID, target);
        }

        let optional = [
            (tags::SENDER_SUB_ID, &self.config.sender_sub_id),
            (tags::TARGET_SUB_ID, &self.config.target_sub_id),
            (tags::SENDER_LOCATION_ID, &self.config.sender_location_id),
            (tags::TARGET_LOCATION_ID, &self.config.target_location_id),
        ];
        for (tag, value) in optional {
            if let Some(value) = value {
                message.set(tag, value);
            }
        }

        message.set(tags::MSG_SEQ_NUM, self.sequence.allocate());
        message.set(tags::SENDING_TIME, Timestamp::now());
        self.heartbeat.on_message_sent();
        message
    }

    fn on_logon(&mut self, message: &Message) -> Vec<SessionAction> {
        let Some(peer) = message.get(tags::SENDER_COMP_ID).and_then(CompId::new) else {
            return self.refuse(SessionError::LogonRejected {
                reason: "missing or invalid SenderCompID".to_string(),
            });
        };
        match &self.target {
            Some(expected) if *expected != peer => {
                let reason = format!("unexpected SenderCompID {peer}, expected {expected}");
                return self.refuse(SessionError::LogonRejected { reason });
            }
            Some(_) => {}
            None => self.target = Some(peer.clone()),
        }

        let reset = message.get(tags::RESET_SEQ_NUM_FLAG) == Some("Y");
        let mut actions = Vec::with_capacity(2);

        if self.role == Role::Acceptor {
            if let Some(secs) = message
                .get_as::<u64>(tags::HEART_BT_INT)
                .ok()
                .filter(|secs| *secs > 0)
            {
                self.heartbeat.set_interval(Duration::from_secs(secs));
            }
            if reset {
                self.sequence.reset();
            }
            actions.push(SessionAction::Send(self.logon_message(reset)));
        }

        self.status = SessionStatus::Active;
        info!(
            sender = %self.config.sender_comp_id,
            target = %peer,
            heartbeat_secs = self.heartbeat.interval().as_secs(),
            "session logged on"
        );
        actions.push(SessionAction::Event(SessionEvent::Logon(LogonEvent {
            sender_comp_id: self.config.sender_comp_id.clone(),
            target_comp_id: peer,
            heartbeat_interval: self.heartbeat.interval(),
            reset_seq_num: reset,
        })));
        actions
    }

    fn on_active_message(&mut self, message: Message) -> Vec<SessionAction> {
        let msg_type = message.msg_type().clone();
        match msg_type {
            MsgType::Heartbeat => Vec::new(),
            MsgType::TestRequest => {
                let mut heartbeat = Message::new(MsgType::Heartbeat);
                if let Some(id) = message.get(tags::TEST_REQ_ID) {
                    heartbeat.add(tags::TEST_REQ_ID, id);
                }
                vec![SessionAction::Send(heartbeat)]
            }
            MsgType::Reject => {
                let event = RejectEvent {
                    ref_seq_num: message.get_as::<u64>(tags::REF_SEQ_NUM).ok().map(SeqNum::new),
                    reason: message.get_as(tags::SESSION_REJECT_REASON).ok(),
                    text: message.get(tags::TEXT).map(str::to_string),
                    message,
                };
                warn!(ref_seq_num = ?event.ref_seq_num, text = ?event.text, "session reject received");
                vec![SessionAction::Event(SessionEvent::Reject(event))]
            }
            MsgType::Logout => {
                let text = message.get(tags::TEXT).map(str::to_string);
                info!(text = ?text, "counterparty logged out");
                self.status = SessionStatus::Closed;
                vec![
                    SessionAction::Send(Message::new(MsgType::Logout)),
                    SessionAction::Event(SessionEvent::Logout(LogoutEvent {
                        origin: LogoutOrigin::Remote,
                        text,
                    })),
                    SessionAction::Disconnect,
                ]
            }
            MsgType::Logon => {
                debug!("duplicate logon ignored");
                Vec::new()
            }
            MsgType::ResendRequest | MsgType::SequenceReset => {
                debug!(%msg_type, "sequence recovery is not supported, message ignored");
                Vec::new()
            }
            _ => vec![SessionAction::Deliver(message)],
        }
    }

    fn refuse(&mut self, err: SessionError) -> Vec<SessionAction> {
        warn!(error = %err, "refusing session");
        self.status = SessionStatus::Closed;
        vec![
            SessionAction::Send(Message::new(MsgType::Logout).with(tags::TEXT, err)),
            SessionAction::Disconnect,
        ]
    }

    fn logon_message(&self, reset: bool) -> Message {
        let mut logon = Message::new(MsgType::Logon)
            .with(tags::ENCRYPT_METHOD, 0)
            .with(tags::HEART_BT_INT, self.heartbeat.interval().as_secs());
        if reset {
            logon.add(tags::RESET_SEQ_NUM_FLAG, "Y");
        }
        logon
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
