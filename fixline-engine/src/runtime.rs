/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Runtime construction shared by the client and server connectors.

use fixline_core::error::{ConnectionError, IllegalStateError};
use tokio::runtime::{Builder, Handle, Runtime};

/// Fails if called from inside a tokio runtime, where blocking would stall
/// or panic the executor.
pub(crate) fn ensure_blocking_allowed() -> Result<(), IllegalStateError> {
    match Handle::try_current() {
        Ok(_) => Err(IllegalStateError::BlockingInAsyncContext),
        Err(_) => Ok(()),
    }
}

/// Builds a multi-thread runtime with `threads` workers named `name-N`.
pub(crate) fn build(name: &'static str, threads: usize) -> Result<Runtime, ConnectionError> {
    Builder::new_multi_thread()
        .worker_threads(threads.max(1))
        .thread_name(name)
        .enable_all()
        .build()
        .map_err(|e| ConnectionError::Runtime(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_allowed_outside_runtime() {
        assert!(ensure_blocking_allowed().is_ok());
    }

    #[tokio::test]
    async fn test_blocking_refused_inside_runtime() {
        assert_eq!(
            ensure_blocking_allowed(),
            Err(IllegalStateError::BlockingInAsyncContext)
        );
    }

    #[test]
    fn test_build_runtime() {
        let runtime = build("fixline-test", 2).unwrap();
        assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
        runtime.shutdown_background();
    }
}
