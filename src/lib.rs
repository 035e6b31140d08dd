//! University-admission prediction orchestration engine.
//!
//! Expands a persisted student profile into the combinatorial set of
//! admission scenarios it could plausibly be evaluated under, dispatches
//! those scenarios to a remote inference server across three pipelines
//! (L1 priority-based, L2 exam-based, L3 transcript-based), and returns
//! deduplicated, ranked predictions.

pub mod backoff;
pub mod chunk_planner;
pub mod concurrency;
pub mod config;
pub mod domain;
pub mod dynamic_concurrency;
pub mod error;
pub mod executor;
pub mod expander;
pub mod http_client;
pub mod pipeline;
pub mod postprocess;
pub mod repository;

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::domain::profile::StudentProfile;
    pub use crate::error::{EngineError, Result};
    pub use crate::http_client::PredictionHttpClient;
    pub use crate::pipeline::PipelineOrchestrator;
    pub use crate::repository::{StaticRepository, StudentRepository};
}
