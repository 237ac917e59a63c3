//! Retry policy for transient artifact I/O (§4.4, §7): up to 2 retries
//! with exponential backoff. Deterministic failures (`InvalidAudio`,
//! `UnknownRecipe`, and anything else [`OrchestratorError::is_retryable`]
//! reports `false` for) are never retried.

use std::time::Duration;

use crate::errors::OrchestratorError;

const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Run `op`, retrying up to [`MAX_RETRIES`] times with exponential backoff
/// if the failure is retryable per [`OrchestratorError::is_retryable`].
pub async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> Result<T, OrchestratorError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, OrchestratorError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < MAX_RETRIES => {
                attempt += 1;
                let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                log::warn!("{label} failed (attempt {attempt}/{MAX_RETRIES}), retrying in {backoff:?}: {error}");
                tokio::time::sleep(backoff).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_retrying() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, OrchestratorError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_a_transient_failure_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(OrchestratorError::ArtifactFetch { uri: "x".to_string(), source: std::io::Error::other("boom") })
            } else {
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(OrchestratorError::ArtifactFetch { uri: "x".to_string(), source: std::io::Error::other("boom") })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_a_deterministic_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(OrchestratorError::Cancelled)
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
