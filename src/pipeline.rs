//! Pipeline orchestrator (§4.9): the three top-level entry points. Each
//! fetches the student, expands to request inputs, dispatches through the
//! chunked batch executor, and post-processes the results.
//!
//! Dispatch is fully concurrent (§5): every chunk/group is its own task,
//! bounded by the chunk gate (`server_batch_concurrency`), mirroring the
//! `join_all`-over-futures shape `executor::individual_fallback` already
//! uses for its own bounded fan-out. The Stage-2 individual-fallback gate
//! (`service_prediction_concurrency`) is a second, independent semaphore —
//! §4.2 names these as two distinct bounds, not one gate reused twice.

use crate::chunk_planner::{optimal_chunk_size, ChunkPlannerHints, ProcessingComplexity};
use crate::concurrency::ConcurrencyGate;
use crate::config::EngineConfig;
use crate::domain::profile::StudentProfile;
use crate::domain::wire::{L1PredictResult, L2PredictResult, L3PredictResult, UserInputL1, UserInputL2, UserInputL3};
use crate::error::{EngineError, Result};
use crate::executor::{execute_group, BatchEndpoint};
use crate::expander::{l1, l2, l3};
use crate::http_client::PredictionHttpClient;
use crate::postprocess::{postprocess_l1, postprocess_l2, postprocess_l3};
use crate::repository::StudentRepository;
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

pub struct PipelineOrchestrator<R: StudentRepository> {
    repository: R,
    http: PredictionHttpClient,
    config: EngineConfig,
}

impl<R: StudentRepository> PipelineOrchestrator<R> {
    pub fn new(repository: R, http: PredictionHttpClient, config: EngineConfig) -> Self {
        Self { repository, http, config }
    }

    pub async fn run_l1(&self, student_id: &str, user_id: Option<&str>) -> Result<Vec<L1PredictResult>> {
        let invocation_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        info!(%invocation_id, %started_at, student_id, pipeline = "l1", "pipeline invocation started");

        let profile = self.fetch_student(student_id, user_id).await?;
        let inputs = l1::expand(&profile)?;
        if inputs.is_empty() {
            return Err(EngineError::invalid_input("L1 expansion produced no request inputs"));
        }

        let groups = group_by(inputs, |i| i.nhom_nganh.clone());
        let endpoint = L1Endpoint { http: self.http.clone() };
        let chunk_delay = self.config.service_l1_chunk_delay_ms;
        let max_chunk_size = self.config.service_l1_chunk_size_input_array;
        let cancel = CancellationToken::new();
        let chunk_gate = ConcurrencyGate::new(self.config.server_batch_concurrency);
        let fallback_gate = ConcurrencyGate::new(self.config.service_prediction_concurrency);

        let results = dispatch_chunked(
            groups,
            &endpoint,
            &self.config,
            &chunk_gate,
            &fallback_gate,
            &cancel,
            chunk_delay,
            max_chunk_size,
        )
        .await;

        Ok(postprocess_l1(results))
    }

    pub async fn run_l2(&self, student_id: &str, user_id: Option<&str>) -> Result<Vec<L2PredictResult>> {
        let invocation_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        info!(%invocation_id, %started_at, student_id, pipeline = "l2", "pipeline invocation started");

        let profile = self.fetch_student(student_id, user_id).await?;
        let inputs = l2::expand(&profile)?;
        if inputs.is_empty() {
            return Err(EngineError::invalid_input("L2 expansion produced no request inputs"));
        }

        let groups = group_by(inputs, |i| i.to_hop_mon.clone());
        let endpoint = L2Endpoint { http: self.http.clone() };
        let chunk_delay = self.config.service_l2_chunk_delay_ms;
        let max_chunk_size = self.config.service_l2_chunk_size_input_array;
        let cancel = CancellationToken::new();
        let chunk_gate = ConcurrencyGate::new(self.config.server_batch_concurrency);
        let fallback_gate = ConcurrencyGate::new(self.config.service_prediction_concurrency);

        let results = dispatch_chunked(
            groups,
            &endpoint,
            &self.config,
            &chunk_gate,
            &fallback_gate,
            &cancel,
            chunk_delay,
            max_chunk_size,
        )
        .await;

        Ok(postprocess_l2(results))
    }

    pub async fn run_l3(&self, student_id: &str, user_id: Option<&str>) -> Result<Vec<L3PredictResult>> {
        let invocation_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        info!(%invocation_id, %started_at, student_id, pipeline = "l3", "pipeline invocation started");

        let profile = self.fetch_student(student_id, user_id).await?;
        let files = self.repository.find_active_files(student_id).await?;
        let inputs = l3::expand(&profile, &files)?;
        if inputs.is_empty() {
            return Err(EngineError::invalid_input("L3 expansion produced no request inputs"));
        }

        // L3 processes whole major-groups without sub-chunking.
        let groups = group_by(inputs, |i| i.nhom_nganh.clone());
        let endpoint = L3Endpoint { http: self.http.clone() };
        let cancel = CancellationToken::new();
        let group_gate = ConcurrencyGate::new(self.config.server_batch_concurrency);
        let fallback_gate = ConcurrencyGate::new(self.config.service_prediction_concurrency);
        let config = &self.config;

        let tasks = groups.into_iter().map(|(group_key, group_inputs)| {
            let endpoint = &endpoint;
            let group_gate = &group_gate;
            let fallback_gate = &fallback_gate;
            let cancel = &cancel;
            async move {
                if cancel.is_cancelled() {
                    return Vec::new();
                }
                let Some(_permit) = group_gate.acquire(cancel).await else { return Vec::new() };
                execute_group(group_inputs, endpoint, config, fallback_gate, cancel, &group_key, true).await
            }
        });
        let results: Vec<L3PredictResult> = join_all(tasks).await.into_iter().flatten().collect();

        Ok(postprocess_l3(results))
    }

    async fn fetch_student(&self, student_id: &str, user_id: Option<&str>) -> Result<StudentProfile> {
        self.repository
            .find_student(student_id, user_id)
            .await?
            .ok_or_else(|| EngineError::not_found(student_id))
    }
}

/// Groups inputs by key, preserving first-seen insertion order (the
/// iteration order used for chunk dispatch, §5).
fn group_by<T>(inputs: Vec<T>, key_fn: impl Fn(&T) -> String) -> IndexMap<String, Vec<T>> {
    let mut groups: IndexMap<String, Vec<T>> = IndexMap::new();
    for input in inputs {
        let key = key_fn(&input);
        groups.entry(key).or_default().push(input);
    }
    groups
}

/// Splits each group into chunks via the chunk planner, then spawns one
/// task per chunk — bounded by `chunk_gate`, the way `individual_fallback`
/// (`executor.rs`) bounds its own per-input fan-out — rather than awaiting
/// each chunk's full three-stage cascade before starting the next. First
/// chunk in a group carries no delay; later chunks in the same group wait
/// `chunk_delay_ms` before acquiring a permit, preserving per-group pacing
/// while still letting chunks from different groups run concurrently.
async fn dispatch_chunked<I, O, E>(
    groups: IndexMap<String, Vec<I>>,
    endpoint: &E,
    config: &EngineConfig,
    chunk_gate: &ConcurrencyGate,
    fallback_gate: &ConcurrencyGate,
    cancel: &CancellationToken,
    chunk_delay_ms: u64,
    max_chunk_size: usize,
) -> Vec<O>
where
    I: Clone + Send + Sync + serde::Serialize,
    O: Send,
    E: BatchEndpoint<I, O>,
{
    let hints = ChunkPlannerHints {
        server_concurrency: config.server_batch_concurrency,
        network_latency_ms: config.service_network_latency_ms,
        memory_limit_mb: config.service_memory_limit_mb,
        processing_complexity: ProcessingComplexity::Medium,
        max_chunk_size,
    };

    let mut tasks = Vec::new();
    for (group_key, inputs) in groups {
        let chunk_size = optimal_chunk_size(inputs.len(), hints).chunk_size;
        let chunks: Vec<Vec<I>> = inputs.chunks(chunk_size.max(1)).map(|c| c.to_vec()).collect();
        info!(group = %group_key, chunk_count = chunks.len(), chunk_size, "dispatching chunked group");

        for (i, chunk) in chunks.into_iter().enumerate() {
            let group_key = group_key.clone();
            tasks.push(async move {
                if i > 0 {
                    crate::backoff::delay(chunk_delay_ms, cancel).await;
                }
                if cancel.is_cancelled() {
                    return Vec::new();
                }
                let Some(_permit) = chunk_gate.acquire(cancel).await else { return Vec::new() };
                execute_group(chunk, endpoint, config, fallback_gate, cancel, &group_key, false).await
            });
        }
    }

    join_all(tasks).await.into_iter().flatten().collect()
}

struct L1Endpoint {
    http: PredictionHttpClient,
}

#[async_trait]
impl BatchEndpoint<UserInputL1, L1PredictResult> for L1Endpoint {
    async fn batch(&self, inputs: &[UserInputL1], concurrency: usize) -> Result<Vec<L1PredictResult>> {
        self.http.predict_l1_batch(inputs, concurrency).await
    }

    async fn single(&self, input: &UserInputL1) -> Result<Vec<L1PredictResult>> {
        self.http.predict_l1(input).await
    }
}

struct L2Endpoint {
    http: PredictionHttpClient,
}

#[async_trait]
impl BatchEndpoint<UserInputL2, L2PredictResult> for L2Endpoint {
    async fn batch(&self, inputs: &[UserInputL2], concurrency: usize) -> Result<Vec<L2PredictResult>> {
        self.http.predict_l2_batch(inputs, concurrency).await
    }

    async fn single(&self, input: &UserInputL2) -> Result<Vec<L2PredictResult>> {
        self.http.predict_l2(input).await
    }
}

struct L3Endpoint {
    http: PredictionHttpClient,
}

#[async_trait]
impl BatchEndpoint<UserInputL3, L3PredictResult> for L3Endpoint {
    async fn batch(&self, inputs: &[UserInputL3], _concurrency: usize) -> Result<Vec<L3PredictResult>> {
        self.http.calculate_l3_batch(inputs).await
    }

    async fn single(&self, input: &UserInputL3) -> Result<Vec<L3PredictResult>> {
        self.http.calculate_l3(input).await.map(|r| vec![r])
    }
}
