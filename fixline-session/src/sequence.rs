/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Sequence number bookkeeping.
//!
//! Outbound MsgSeqNum values come from a monotonically increasing counter.
//! Inbound values are only recorded for diagnostics; there is no gap
//! detection and no resend store.

use fixline_core::types::SeqNum;

/// Tracks sequence numbers for one connection.
#[derive(Debug, Default)]
pub struct SequenceManager {
    next_outbound: SeqNum,
    last_inbound: Option<SeqNum>,
}

impl SequenceManager {
    /// Creates a manager whose first outbound number is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number the next outbound message will carry.
    #[inline]
    #[must_use]
    pub fn next_outbound(&self) -> SeqNum {
        self.next_outbound
    }

    /// Allocates the next outbound number.
    #[inline]
    pub fn allocate(&mut self) -> SeqNum {
        let seq = self.next_outbound;
        self.next_outbound = seq.next();
        seq
    }

    /// Records the MsgSeqNum of an inbound message, if it had one.
    pub fn observe_inbound(&mut self, seq: Option<SeqNum>) {
        if seq.is_some() {
            self.last_inbound = seq;
        }
    }

    /// Returns the last inbound MsgSeqNum seen.
    #[must_use]
    pub fn last_inbound(&self) -> Option<SeqNum> {
        self.last_inbound
    }

    /// Restarts outbound numbering at 1 and forgets inbound history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_monotonic() {
        let mut mgr = SequenceManager::new();
        assert_eq!(mgr.allocate().value(), 1);
        assert_eq!(mgr.allocate().value(), 2);
        assert_eq!(mgr.next_outbound().value(), 3);
    }

    #[test]
    fn test_observe_inbound_keeps_last_known() {
        let mut mgr = SequenceManager::new();
        mgr.observe_inbound(Some(SeqNum::new(7)));
        mgr.observe_inbound(None);
        assert_eq!(mgr.last_inbound(), Some(SeqNum::new(7)));
    }

    #[test]
    fn test_reset() {
        let mut mgr = SequenceManager::new();
        mgr.allocate();
        mgr.observe_inbound(Some(SeqNum::new(3)));

        mgr.reset();
        assert_eq!(mgr.next_outbound().value(), 1);
        assert!(mgr.last_inbound().is_none());
    }
}
