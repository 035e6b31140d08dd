//! Cancellable sleeps and backoff scaling (§4.1). Every wait in the engine
//! — backoff, inter-chunk, inter-request, inter-iteration — is routed
//! through `delay` so tests can drive a virtual clock and invocations can
//! be cancelled mid-flight.

use tokio_util::sync::CancellationToken as CancelToken;

/// Outcome of a cancellable sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    Done,
    Cancelled,
}

/// Sleeps for `ms` milliseconds, or returns early with `Cancelled` if the
/// token fires first.
pub async fn delay(ms: u64, cancel: &CancelToken) -> DelayOutcome {
    if ms == 0 {
        return if cancel.is_cancelled() { DelayOutcome::Cancelled } else { DelayOutcome::Done };
    }
    tokio::select! {
        _ = tokio::time::sleep(std::time::Duration::from_millis(ms)) => DelayOutcome::Done,
        _ = cancel.cancelled() => DelayOutcome::Cancelled,
    }
}

/// Linear backoff for Stage 3 sequential retry: delay before attempt `k`
/// (1-indexed) is `base_delay_ms * k`.
pub fn linear_backoff_ms(base_delay_ms: u64, attempt: u32) -> u64 {
    base_delay_ms.saturating_mul(attempt as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff_scales_with_attempt() {
        assert_eq!(linear_backoff_ms(500, 1), 500);
        assert_eq!(linear_backoff_ms(500, 2), 1000);
        assert_eq!(linear_backoff_ms(500, 3), 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_completes_without_cancellation() {
        let cancel = CancelToken::new();
        let outcome = delay(1_000, &cancel).await;
        assert_eq!(outcome, DelayOutcome::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_short_circuits_on_cancellation() {
        let cancel = CancelToken::new();
        let c2 = cancel.clone();
        tokio::spawn(async move {
            c2.cancel();
        });
        tokio::task::yield_now().await;
        let outcome = delay(60_000, &cancel).await;
        assert_eq!(outcome, DelayOutcome::Cancelled);
    }
}
