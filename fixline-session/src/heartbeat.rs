/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Heartbeat and TestRequest timing.
//!
//! [`HeartbeatManager`] only keeps clocks; [`HeartbeatManager::poll`] tells
//! the session stage what the clocks say should happen next.

use std::time::{Duration, Instant};

/// What the heartbeat clocks require right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatDue {
    /// Nothing to do.
    Idle,
    /// We have been silent for a full interval.
    Heartbeat,
    /// The counterparty has been silent for the interval plus grace.
    TestRequest,
    /// A TestRequest went unanswered for a full interval.
    TimedOut {
        /// Time since the last inbound message.
        silence: Duration,
    },
}

/// Manages heartbeat timing for a FIX session.
#[derive(Debug)]
pub struct HeartbeatManager {
    interval: Duration,
    grace: Duration,
    last_sent: Instant,
    last_received: Instant,
    test_request_pending: Option<String>,
    test_request_sent_at: Option<Instant>,
    test_requests_sent: u64,
}

impl HeartbeatManager {
    /// Creates a manager with the given interval and a one-second grace.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            grace: Duration::from_secs(1),
            last_sent: now,
            last_received: now,
            test_request_pending: None,
            test_request_sent_at: None,
            test_requests_sent: 0,
        }
    }

    /// Sets the extra silence tolerated before a TestRequest.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Changes the interval, e.g. after the counterparty's Logon.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_message_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records that a message was received.
    ///
    /// Any inbound traffic proves the counterparty is alive, so a pending
    /// TestRequest is cleared regardless of the TestReqID echoed.
    pub fn on_message_received(&mut self) {
        self.last_received = Instant::now();
        self.test_request_pending = None;
        self.test_request_sent_at = None;
    }

    /// Allocates a TestReqID and records the TestRequest as sent.
    pub fn begin_test_request(&mut self) -> String {
        self.test_requests_sent += 1;
        let id = format!("TEST-{}", self.test_requests_sent);
        let now = Instant::now();
        self.test_request_pending = Some(id.clone());
        self.test_request_sent_at = Some(now);
        id
    }

    /// Evaluates the clocks.
    ///
    /// A timeout takes precedence over a TestRequest, which takes
    /// precedence over a plain heartbeat.
    #[must_use]
    pub fn poll(&self) -> HeartbeatDue {
        if let Some(sent_at) = self.test_request_sent_at {
            if sent_at.elapsed() >= self.interval {
                return HeartbeatDue::TimedOut {
                    silence: self.last_received.elapsed(),
                };
            }
        } else if self.last_received.elapsed() >= self.interval + self.grace {
            return HeartbeatDue::TestRequest;
        }

        if self.last_sent.elapsed() >= self.interval {
            HeartbeatDue::Heartbeat
        } else {
            HeartbeatDue::Idle
        }
    }

    /// Returns the pending TestRequest ID, if any.
    #[must_use]
    pub fn pending_test_request(&self) -> Option<&str> {
        self.test_request_pending.as_deref()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Restarts both clocks and drops any pending TestRequest.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_sent = now;
        self.last_received = now;
        self.test_request_pending = None;
        self.test_request_sent_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_heartbeat_manager_new() {
        let mgr = HeartbeatManager::new(Duration::from_secs(30));
        assert_eq!(mgr.interval(), Duration::from_secs(30));
        assert!(mgr.pending_test_request().is_none());
        assert_eq!(mgr.poll(), HeartbeatDue::Idle);
    }

    #[test]
    fn test_heartbeat_due_after_silence() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(20)).with_grace(Duration::from_secs(60));
        sleep(Duration::from_millis(30));
        assert_eq!(mgr.poll(), HeartbeatDue::Heartbeat);

        mgr.on_message_sent();
        assert_eq!(mgr.poll(), HeartbeatDue::Idle);
    }

    #[test]
    fn test_test_request_then_timeout() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(20)).with_grace(Duration::from_millis(5));
        sleep(Duration::from_millis(30));
        assert_eq!(mgr.poll(), HeartbeatDue::TestRequest);

        let id = mgr.begin_test_request();
        assert_eq!(id, "TEST-1");
        assert_eq!(mgr.pending_test_request(), Some("TEST-1"));
        assert_ne!(mgr.poll(), HeartbeatDue::TestRequest);

        sleep(Duration::from_millis(30));
        assert!(matches!(mgr.poll(), HeartbeatDue::TimedOut { .. }));
    }

    #[test]
    fn test_inbound_clears_pending_request() {
        let mut mgr = HeartbeatManager::new(Duration::from_secs(30));
        mgr.begin_test_request();
        mgr.on_message_received();
        assert!(mgr.pending_test_request().is_none());
        assert_eq!(mgr.begin_test_request(), "TEST-2");
    }
}
