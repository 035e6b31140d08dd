//! Concurrency gate (§4.2): a bounded in-flight counter used both for
//! top-level chunk dispatch and for the Stage-2 individual-fallback
//! fan-out. Mirrors the semaphore-guarded worker pattern this codebase
//! already uses for bounded parallel dispatch.

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;

/// A bounded gate. `acquire` suspends until the in-flight count is below
/// `bound`; it honors cancellation, returning `None` if the invocation's
/// cancellation token fires first.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    pub fn new(bound: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(bound.max(1))) }
    }

    /// Acquires a permit, or `None` if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<SemaphorePermit<'_>> {
        tokio::select! {
            permit = self.semaphore.acquire() => permit.ok(),
            _ = cancel.cancelled() => None,
        }
    }
}
