//! # Bounded Calls
//!
//! Every suspension point that reaches outside the process (chain RPC,
//! database, network endpoint open/close) runs through [`bounded`], which
//! races the call against both a timeout and the caller's cancellation token.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a bounded call did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The timeout elapsed first.
    Timeout(Duration),
    /// The token was cancelled first.
    Cancelled,
}

/// Run `fut` until it completes, `timeout` elapses or `cancel` fires.
///
/// Cancellation wins ties so that shutdown is never delayed by a call that
/// happens to be ready at the same instant.
pub async fn bounded<F, T>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: F,
) -> Result<T, Interrupted>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = tokio::time::timeout(timeout, fut) => {
            result.map_err(|_| Interrupted::Timeout(timeout))
        }
    }
}

/// [`bounded`] for fallible calls, folding the interruption into `E`.
pub async fn bounded_call<F, T, E>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Interrupted>,
{
    match bounded(cancel, timeout, fut).await {
        Ok(result) => result,
        Err(interrupted) => Err(E::from(interrupted)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ChainError;

    #[tokio::test(start_paused = true)]
    async fn test_completes_within_bound() {
        let token = CancellationToken::new();
        let result = bounded(&token, Duration::from_secs(1), async { 5 }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let token = CancellationToken::new();
        let result = bounded(
            &token,
            Duration::from_secs(1),
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;
        assert_eq!(result, Err(Interrupted::Timeout(Duration::from_secs(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_hung_call() {
        let token = CancellationToken::new();
        let child = token.child_token();
        token.cancel();
        let result = bounded(&child, Duration::from_secs(60), std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_call_folds_errors() {
        let token = CancellationToken::new();
        let ok: Result<u8, ChainError> =
            bounded_call(&token, Duration::from_secs(1), async { Ok(1) }).await;
        assert_eq!(ok, Ok(1));

        let timed_out: Result<u8, ChainError> = bounded_call(&token, Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;
        assert_eq!(timed_out, Err(ChainError::Timeout(Duration::from_secs(1))));
    }
}
