//! Per-job cancellation: a lightweight `watch`-backed flag, checked at
//! stage boundaries only (§5 — in-flight DSP of a stage always completes
//! before an abort). One flag per job, set by the orchestrator and read by
//! that job's worker task — distinct from any process-wide shutdown signal.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

impl CancelToken {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

#[must_use]
pub fn cancellation_pair() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelToken { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_token_is_not_cancelled() {
        let (_handle, token) = cancellation_pair();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancelling_the_handle_is_observed_by_the_token() {
        let (handle, token) = cancellation_pair();
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn a_cloned_token_observes_the_same_cancellation() {
        let (handle, token) = cancellation_pair();
        let cloned = token.clone();
        handle.cancel();
        assert!(cloned.is_cancelled());
    }
}
