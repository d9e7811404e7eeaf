/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Connection-closed latch.
//!
//! [`CloseFuture`] completes once, when the connection's driver task ends
//! for any reason. It can be waited on from plain threads or awaited from
//! async code.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Latch {
    closed: Mutex<bool>,
    condvar: Condvar,
    notify: Notify,
}

/// Handle that resolves when a connection has closed.
#[derive(Debug, Clone)]
pub struct CloseFuture {
    latch: Arc<Latch>,
}

impl CloseFuture {
    /// Returns true if the connection has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.latch.closed.lock()
    }

    /// Blocks the calling thread until the connection closes.
    pub fn wait(&self) {
        let mut closed = self.latch.closed.lock();
        while !*closed {
            self.latch.condvar.wait(&mut closed);
        }
    }

    /// Blocks for at most `timeout`. Returns true if the connection closed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut closed = self.latch.closed.lock();
        if !*closed {
            self.latch
                .condvar
                .wait_while_for(&mut closed, |closed| !*closed, timeout);
        }
        *closed
    }

    /// Waits asynchronously until the connection closes.
    pub async fn closed(&self) {
        loop {
            let notified = self.latch.notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}

/// Completes a [`CloseFuture`] when dropped.
///
/// Held by the driver task so the latch is released on every exit path,
/// including panics and runtime shutdown.
#[derive(Debug)]
pub(crate) struct CloseGuard {
    latch: Arc<Latch>,
}

impl CloseGuard {
    pub(crate) fn new() -> (Self, CloseFuture) {
        let latch = Arc::new(Latch::default());
        (
            Self {
                latch: Arc::clone(&latch),
            },
            CloseFuture { latch },
        )
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        *self.latch.closed.lock() = true;
        self.latch.condvar.notify_all();
        self.latch.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drop_releases_waiters() {
        let (guard, close) = CloseGuard::new();
        assert!(!close.is_closed());
        assert!(!close.wait_timeout(Duration::from_millis(10)));

        let waiter = {
            let close = close.clone();
            thread::spawn(move || close.wait())
        };
        drop(guard);
        waiter.join().unwrap();

        assert!(close.is_closed());
        assert!(close.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_released_on_panic() {
        let (guard, close) = CloseGuard::new();
        let result = thread::spawn(move || {
            let _guard = guard;
            panic!("driver failed");
        })
        .join();

        assert!(result.is_err());
        assert!(close.is_closed());
    }

    #[tokio::test]
    async fn test_closed_awaits_drop() {
        let (guard, close) = CloseGuard::new();
        let waiter = tokio::spawn({
            let close = close.clone();
            async move { close.closed().await }
        });

        tokio::task::yield_now().await;
        drop(guard);
        waiter.await.unwrap();
        close.closed().await;
    }
}
