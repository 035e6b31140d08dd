//! Batch executor with the three-stage retry cascade (§4.7): per-group
//! batch attempt, then parallel per-input fallback, then strict sequential
//! retry with linear backoff. `failedInputs` is the only handoff between
//! stages; no other cross-stage state is kept.

use crate::backoff::delay;
use crate::concurrency::ConcurrencyGate;
use crate::config::EngineConfig;
use crate::dynamic_concurrency::dynamic_concurrency;
use crate::error::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Truncation cap for the sample-input preview logged on an L3 batch
/// failure, matching the teacher's truncated-response-preview convention.
const SAMPLE_PREVIEW_LEN: usize = 200;

/// The HTTP surface an executor needs for one pipeline: a batch call and a
/// single-input call, both returning zero or more output elements.
#[async_trait]
pub trait BatchEndpoint<I, O>: Send + Sync {
    async fn batch(&self, inputs: &[I], concurrency: usize) -> Result<Vec<O>>;
    async fn single(&self, input: &I) -> Result<Vec<O>>;
}

/// Runs the three-stage cascade for a single group's inputs. Permanently
/// failed inputs are logged and silently dropped — partial success is the
/// contract (§4.7, §7).
pub async fn execute_group<I, O, E>(
    inputs: Vec<I>,
    endpoint: &E,
    config: &EngineConfig,
    fallback_gate: &ConcurrencyGate,
    cancel: &CancellationToken,
    group_key: &str,
    log_sample_on_batch_error: bool,
) -> Vec<O>
where
    I: Clone + Send + Sync + Serialize,
    O: Send,
    E: BatchEndpoint<I, O>,
{
    if inputs.is_empty() {
        return Vec::new();
    }

    let concurrency = dynamic_concurrency(
        inputs.len(),
        config.service_inputs_per_worker,
        config.service_min_batch_concurrency,
        config.service_batch_concurrency,
    );

    // Stage 1: batch attempt.
    match endpoint.batch(&inputs, concurrency).await {
        Ok(results) => {
            info!(
                group = group_key,
                stage = "batch",
                attempted = inputs.len(),
                succeeded = inputs.len(),
                failed = 0,
                concurrency,
                "stage 1 batch attempt succeeded"
            );
            return results;
        }
        Err(e) => {
            if log_sample_on_batch_error {
                let sample = sample_preview(&inputs[0]);
                warn!(group = group_key, stage = "batch", error = %e, sample, "stage 1 batch attempt failed, falling back");
            } else {
                warn!(group = group_key, stage = "batch", error = %e, "stage 1 batch attempt failed, falling back");
            }
        }
    }

    if cancel.is_cancelled() {
        return Vec::new();
    }

    let (mut results, failed) = individual_fallback(&inputs, endpoint, config, fallback_gate, cancel, group_key).await;
    info!(
        group = group_key,
        stage = "fallback",
        attempted = inputs.len(),
        succeeded = inputs.len() - failed.len(),
        failed = failed.len(),
        "stage 2 individual fallback complete"
    );

    let recovered = sequential_retry(failed, endpoint, config, cancel, group_key).await;
    results.extend(recovered);
    results
}

/// Stage 2: parallel, bounded individual fallback. Returns successes and
/// the list of inputs that still failed, to be handed to Stage 3.
async fn individual_fallback<I, O, E>(
    inputs: &[I],
    endpoint: &E,
    config: &EngineConfig,
    gate: &ConcurrencyGate,
    cancel: &CancellationToken,
    group_key: &str,
) -> (Vec<O>, Vec<I>)
where
    I: Clone + Send + Sync,
    O: Send,
    E: BatchEndpoint<I, O>,
{
    delay(config.service_retry_base_delay_ms, cancel).await;

    let tasks = inputs.iter().enumerate().map(|(index, input)| {
        let input = input.clone();
        async move {
            if cancel.is_cancelled() {
                return Err(input);
            }
            let Some(_permit) = gate.acquire(cancel).await else {
                return Err(input);
            };
            if index > 0 {
                delay(config.service_request_delay_ms, cancel).await;
            }
            match endpoint.single(&input).await {
                Ok(results) => Ok(results),
                Err(e) => {
                    warn!(group = group_key, stage = "fallback", index, error = %e, "individual fallback call failed");
                    Err(input)
                }
            }
        }
    });

    let outcomes = join_all(tasks).await;
    let mut results = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(r) => results.extend(r),
            Err(input) => failed.push(input),
        }
    }
    (results, failed)
}

/// Stage 3: strict sequential retry with linear backoff. No delay occurs
/// after the last failed input.
async fn sequential_retry<I, O, E>(
    failed: Vec<I>,
    endpoint: &E,
    config: &EngineConfig,
    cancel: &CancellationToken,
    group_key: &str,
) -> Vec<O>
where
    I: Clone + Send + Sync,
    O: Send,
    E: BatchEndpoint<I, O>,
{
    let total = failed.len();
    let mut results = Vec::new();

    for (i, input) in failed.into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        for attempt in 1..=config.service_max_retries {
            if cancel.is_cancelled() {
                break;
            }
            match endpoint.single(&input).await {
                Ok(r) => {
                    results.extend(r);
                    break;
                }
                Err(e) => {
                    if attempt < config.service_max_retries {
                        let backoff_ms = crate::backoff::linear_backoff_ms(config.service_retry_base_delay_ms, attempt as u32);
                        delay(backoff_ms, cancel).await;
                    } else {
                        error!(group = group_key, stage = "sequential_retry", attempt, error = %e, "input permanently failed after exhausting retries");
                    }
                }
            }
        }

        if i + 1 < total {
            delay(config.service_retry_iteration_delay_ms, cancel).await;
        }
    }

    results
}

/// Serializes a sample input for the L3 batch-failure log, truncated to a
/// fixed length — a preview, not a full dump, matching how response bodies
/// are logged elsewhere in this codebase.
fn sample_preview<I: Serialize>(input: &I) -> String {
    let mut json = serde_json::to_string(input).unwrap_or_else(|_| "<unserializable>".to_string());
    if json.len() > SAMPLE_PREVIEW_LEN {
        json.truncate(SAMPLE_PREVIEW_LEN);
        json.push_str("...");
    }
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyEndpoint {
        batch_calls: AtomicUsize,
        single_calls: AtomicUsize,
        fail_single_until: usize,
    }

    #[async_trait]
    impl BatchEndpoint<u32, u32> for FlakyEndpoint {
        async fn batch(&self, _inputs: &[u32], _concurrency: usize) -> Result<Vec<u32>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::transport("batch endpoint down"))
        }

        async fn single(&self, input: &u32) -> Result<Vec<u32>> {
            let call = self.single_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_single_until {
                Err(EngineError::transport("single endpoint flaky"))
            } else {
                Ok(vec![*input])
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn batch_failure_falls_back_to_individual_inputs() {
        let endpoint = FlakyEndpoint {
            batch_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
            fail_single_until: 0,
        };
        let config = EngineConfig::default();
        let gate = ConcurrencyGate::new(4);
        let cancel = CancellationToken::new();

        let results = execute_group(vec![1u32, 2, 3], &endpoint, &config, &gate, &cancel, "g1", false).await;
        assert_eq!(results.len(), 3);
        assert_eq!(endpoint.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permanently_failing_input_drops_without_panicking() {
        struct AlwaysFails;
        #[async_trait]
        impl BatchEndpoint<u32, u32> for AlwaysFails {
            async fn batch(&self, _inputs: &[u32], _c: usize) -> Result<Vec<u32>> {
                Err(EngineError::transport("down"))
            }
            async fn single(&self, _input: &u32) -> Result<Vec<u32>> {
                Err(EngineError::transport("still down"))
            }
        }
        let config = EngineConfig::default();
        let gate = ConcurrencyGate::new(2);
        let cancel = CancellationToken::new();
        let results = execute_group(vec![1u32], &AlwaysFails, &config, &gate, &cancel, "g1", false).await;
        assert!(results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_retry_recovers_within_max_retries() {
        // Fails stage 1 (batch) and the first stage-2 attempt, then
        // succeeds on the first stage-3 retry.
        struct OnceFails(Arc<AtomicUsize>);
        #[async_trait]
        impl BatchEndpoint<u32, u32> for OnceFails {
            async fn batch(&self, _inputs: &[u32], _c: usize) -> Result<Vec<u32>> {
                Err(EngineError::transport("down"))
            }
            async fn single(&self, input: &u32) -> Result<Vec<u32>> {
                let call = self.0.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    Err(EngineError::transport("flaky"))
                } else {
                    Ok(vec![*input])
                }
            }
        }
        let counter = Arc::new(AtomicUsize::new(0));
        let endpoint = OnceFails(counter);
        let config = EngineConfig::default();
        let gate = ConcurrencyGate::new(2);
        let cancel = CancellationToken::new();
        let results = execute_group(vec![42u32], &endpoint, &config, &gate, &cancel, "g1", false).await;
        assert_eq!(results, vec![42]);
    }

    #[test]
    fn sample_preview_truncates_long_input() {
        let long = "x".repeat(SAMPLE_PREVIEW_LEN * 2);
        let preview = sample_preview(&long);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= SAMPLE_PREVIEW_LEN + 3 + 2); // + quotes from JSON string encoding
    }

    #[tokio::test(start_paused = true)]
    async fn l3_sample_flag_does_not_change_recovery_outcome() {
        // The sample-logging flag only affects what gets logged on a
        // stage-1 batch failure, never whether the cascade recovers.
        let endpoint = FlakyEndpoint {
            batch_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
            fail_single_until: 0,
        };
        let config = EngineConfig::default();
        let gate = ConcurrencyGate::new(4);
        let cancel = CancellationToken::new();

        let results = execute_group(vec![1u32, 2, 3], &endpoint, &config, &gate, &cancel, "g1", true).await;
        assert_eq!(results.len(), 3);
    }
}
