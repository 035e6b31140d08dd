//! Engine-visible configuration for the prediction dispatcher.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All tunables the engine reads to schedule and retry work. All delay
/// fields are milliseconds unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the inference server (e.g. `https://predict.internal`).
    pub inference_base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,

    /// Bound on concurrent chunk dispatch (the "chunk gate").
    pub server_batch_concurrency: usize,
    /// Upper bound for the computed `concurrency` query parameter.
    pub service_batch_concurrency: usize,
    /// Lower bound for the computed `concurrency` query parameter.
    pub service_min_batch_concurrency: usize,
    /// Divisor for dynamic concurrency computation.
    pub service_inputs_per_worker: usize,
    /// Bound on Stage-2 individual-fallback fan-out (the "fallback gate").
    pub service_prediction_concurrency: usize,
    /// Max attempts in Stage 3 (sequential retry).
    pub service_max_retries: usize,
    /// Unit of linear retry backoff (Stage 3: `base * attempt`).
    pub service_retry_base_delay_ms: u64,
    /// Between-input delay in Stage 3.
    pub service_retry_iteration_delay_ms: u64,
    /// Between-request delay in Stage 2.
    pub service_request_delay_ms: u64,
    /// Between-chunk delay for the L1 pipeline.
    pub service_l1_chunk_delay_ms: u64,
    /// Between-chunk delay for the L2 pipeline.
    pub service_l2_chunk_delay_ms: u64,
    /// Chunk planner `maxChunkSize` hint for L1.
    pub service_l1_chunk_size_input_array: usize,
    /// Chunk planner `maxChunkSize` hint for L2.
    pub service_l2_chunk_size_input_array: usize,
    /// Network latency hint (ms) fed into the chunk planner.
    pub service_network_latency_ms: u64,
    /// Memory limit hint (MB) fed into the chunk planner.
    pub service_memory_limit_mb: u64,
}

impl EngineConfig {
    /// Load configuration from the environment, following the same
    /// `.env` + `env::var().ok().and_then(parse).unwrap_or(default)`
    /// convention used throughout this codebase.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cfg = Self {
            inference_base_url: std::env::var("INFERENCE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),

            server_batch_concurrency: env_parse("SERVER_BATCH_CONCURRENCY", 4),
            service_batch_concurrency: env_parse("SERVICE_BATCH_CONCURRENCY", 8),
            service_min_batch_concurrency: env_parse("SERVICE_MIN_BATCH_CONCURRENCY", 1),
            service_inputs_per_worker: env_parse("SERVICE_INPUTS_PER_WORKER", 5),
            service_prediction_concurrency: env_parse("SERVICE_PREDICTION_CONCURRENCY", 6),
            service_max_retries: env_parse("SERVICE_MAX_RETRIES", 3),
            service_retry_base_delay_ms: env_parse("SERVICE_RETRY_BASE_DELAY_MS", 500),
            service_retry_iteration_delay_ms: env_parse("SERVICE_RETRY_ITERATION_DELAY_MS", 200),
            service_request_delay_ms: env_parse("SERVICE_REQUEST_DELAY_MS", 100),
            service_l1_chunk_delay_ms: env_parse("SERVICE_L1_CHUNK_DELAY_MS", 150),
            service_l2_chunk_delay_ms: env_parse("SERVICE_L2_CHUNK_DELAY_MS", 150),
            service_l1_chunk_size_input_array: env_parse("SERVICE_L1_CHUNK_SIZE_INPUT_ARRAY", 20),
            service_l2_chunk_size_input_array: env_parse("SERVICE_L2_CHUNK_SIZE_INPUT_ARRAY", 20),
            service_network_latency_ms: env_parse("SERVICE_NETWORK_LATENCY_MS", 50),
            service_memory_limit_mb: env_parse("SERVICE_MEMORY_LIMIT_MB", 512),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_batch_concurrency == 0 {
            return Err(EngineError::config("server_batch_concurrency must be > 0"));
        }
        if self.service_prediction_concurrency == 0 {
            return Err(EngineError::config(
                "service_prediction_concurrency must be > 0",
            ));
        }
        if self.service_min_batch_concurrency > self.service_batch_concurrency {
            return Err(EngineError::config(
                "service_min_batch_concurrency must be <= service_batch_concurrency",
            ));
        }
        if self.service_max_retries == 0 {
            return Err(EngineError::config("service_max_retries must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
            server_batch_concurrency: 4,
            service_batch_concurrency: 8,
            service_min_batch_concurrency: 1,
            service_inputs_per_worker: 5,
            service_prediction_concurrency: 6,
            service_max_retries: 3,
            service_retry_base_delay_ms: 500,
            service_retry_iteration_delay_ms: 200,
            service_request_delay_ms: 100,
            service_l1_chunk_delay_ms: 150,
            service_l2_chunk_delay_ms: 150,
            service_l1_chunk_size_input_array: 20,
            service_l2_chunk_size_input_array: 20,
            service_network_latency_ms: 50,
            service_memory_limit_mb: 512,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_concurrency_bounds() {
        let mut cfg = EngineConfig::default();
        cfg.service_min_batch_concurrency = cfg.service_batch_concurrency + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_server_batch_concurrency() {
        let mut cfg = EngineConfig::default();
        cfg.server_batch_concurrency = 0;
        assert!(cfg.validate().is_err());
    }
}
