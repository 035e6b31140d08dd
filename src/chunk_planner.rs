//! Chunk planner (§4.4): `optimalChunkSize`, a deterministic pure function
//! of workload size and tuning hints. The limiting factor is exposed for
//! observability only — it never feeds back into the result.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingComplexity {
    Low,
    Medium,
    High,
}

impl ProcessingComplexity {
    fn multiplier(self) -> f64 {
        match self {
            ProcessingComplexity::Low => 1.5,
            ProcessingComplexity::Medium => 1.0,
            ProcessingComplexity::High => 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkPlannerHints {
    pub server_concurrency: usize,
    pub network_latency_ms: u64,
    pub memory_limit_mb: u64,
    pub processing_complexity: ProcessingComplexity,
    pub max_chunk_size: usize,
}

/// Which candidate determined the final chunk size; observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitingFactor {
    SmallDatasetFastPath,
    ComplexityAdjusted,
    NetworkOptimal,
    MemoryBased,
    MaxChunkSize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan {
    pub chunk_size: usize,
    pub limiting_factor: LimitingFactor,
}

/// Exact formula from §4.4. `total_inputs == 0` is not a case the planner
/// is called for; callers must not invoke it on an empty workload.
pub fn optimal_chunk_size(total_inputs: usize, hints: ChunkPlannerHints) -> ChunkPlan {
    let server_concurrency = hints.server_concurrency.max(1);

    if total_inputs <= 2 * server_concurrency {
        return ChunkPlan { chunk_size: 1, limiting_factor: LimitingFactor::SmallDatasetFastPath };
    }

    let concurrency_based = ceil_div(total_inputs, server_concurrency);
    let complexity_adjusted =
        ((concurrency_based as f64) * hints.processing_complexity.multiplier()).floor() as i64;
    let network_optimal_candidate = (hints.network_latency_ms / 10) as i64;
    let network_optimal = (hints.max_chunk_size as i64).min(network_optimal_candidate).max(3);
    let memory_based = (hints.memory_limit_mb / 50) as i64;
    let max_chunk_size = hints.max_chunk_size as i64;

    let candidates = [
        (complexity_adjusted, LimitingFactor::ComplexityAdjusted),
        (network_optimal, LimitingFactor::NetworkOptimal),
        (memory_based, LimitingFactor::MemoryBased),
        (max_chunk_size, LimitingFactor::MaxChunkSize),
    ];

    let (min_value, factor) = candidates
        .into_iter()
        .min_by_key(|(v, _)| *v)
        .expect("candidates is non-empty");

    let result = min_value.max(1) as usize;
    let clamped = result.min(total_inputs);

    ChunkPlan { chunk_size: clamped.max(1), limiting_factor: factor }
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> ChunkPlannerHints {
        ChunkPlannerHints {
            server_concurrency: 4,
            network_latency_ms: 50,
            memory_limit_mb: 512,
            processing_complexity: ProcessingComplexity::Medium,
            max_chunk_size: 20,
        }
    }

    #[test]
    fn small_dataset_returns_one() {
        let plan = optimal_chunk_size(8, hints());
        assert_eq!(plan.chunk_size, 1);
        assert_eq!(plan.limiting_factor, LimitingFactor::SmallDatasetFastPath);
    }

    #[test]
    fn small_dataset_boundary_is_inclusive() {
        // total_inputs == 2 * server_concurrency still hits the fast path.
        let plan = optimal_chunk_size(8, hints());
        assert_eq!(plan.chunk_size, 1);
        let plan = optimal_chunk_size(9, hints());
        assert_ne!(plan.limiting_factor, LimitingFactor::SmallDatasetFastPath);
    }

    #[test]
    fn result_never_exceeds_total_inputs() {
        let plan = optimal_chunk_size(10, hints());
        assert!(plan.chunk_size <= 10);
        assert!(plan.chunk_size >= 1);
    }

    #[test]
    fn result_is_at_least_one_for_large_inputs() {
        let plan = optimal_chunk_size(100_000, hints());
        assert!(plan.chunk_size >= 1);
        assert!(plan.chunk_size <= hints().max_chunk_size);
    }

    #[test]
    fn is_pure_and_deterministic() {
        let a = optimal_chunk_size(37, hints());
        let b = optimal_chunk_size(37, hints());
        assert_eq!(a.chunk_size, b.chunk_size);
    }
}
