//! Result post-processors (§4.8): L1 score-coalescing, L2 highest-score
//! dedup, L3 signature-based dedup. Tie-breaks are first-writer in
//! collection order, matching the insertion-order semantics the rest of
//! the engine preserves.

use crate::domain::wire::{L1PredictResult, L2PredictResult, L3PredictResult};
use indexmap::IndexMap;

/// Coalesces L1 results: for every admission code seen under any priority
/// type, keeps the maximum score observed, then re-groups by the priority
/// type under which that maximum was recorded (§8 invariant 5).
pub fn postprocess_l1(results: Vec<L1PredictResult>) -> Vec<L1PredictResult> {
    let mut best: IndexMap<String, (String, f64)> = IndexMap::new();

    for result in &results {
        for (code, score) in &result.scores {
            match best.get(code) {
                Some((_, existing)) if *existing >= *score => {}
                _ => {
                    best.insert(code.clone(), (result.priority_type.clone(), *score));
                }
            }
        }
    }

    let mut by_priority: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();
    for (code, (priority_type, score)) in best {
        by_priority.entry(priority_type).or_default().insert(code, score);
    }

    by_priority
        .into_iter()
        .map(|(priority_type, scores)| L1PredictResult {
            priority_type,
            scores: scores.into_iter().collect(),
        })
        .collect()
}

/// Keeps, per admission code, the entry with the largest score; ties break
/// first-writer.
pub fn postprocess_l2(results: Vec<L2PredictResult>) -> Vec<L2PredictResult> {
    let mut best: IndexMap<String, L2PredictResult> = IndexMap::new();
    for result in results {
        match best.get(&result.admission_code) {
            Some(existing) if existing.score >= result.score => {}
            _ => {
                best.insert(result.admission_code.clone(), result);
            }
        }
    }
    best.into_values().collect()
}

/// Drops entirely-empty results, then deduplicates by the canonical
/// signature (sorted `university_code:major_code` pairs joined by `|`),
/// keeping the first occurrence per signature.
pub fn postprocess_l3(results: Vec<L3PredictResult>) -> Vec<L3PredictResult> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for result in results {
        if result.result.is_empty() || result.result.values().all(|majors| majors.is_empty()) {
            continue;
        }
        let signature = signature_of(&result);
        if seen.insert(signature) {
            out.push(result);
        }
    }
    out
}

fn signature_of(result: &L3PredictResult) -> String {
    let mut pairs: Vec<String> = result
        .result
        .iter()
        .flat_map(|(university_code, majors)| {
            majors.iter().map(move |m| format!("{university_code}:{}", m.major_code))
        })
        .collect();
    pairs.sort();
    pairs.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wire::L3MajorEntry;
    use std::collections::HashMap;

    #[test]
    fn l2_keeps_highest_score_for_duplicate_code() {
        let results = vec![
            L2PredictResult { admission_code: "X".into(), score: 75.0, extra: HashMap::new() },
            L2PredictResult { admission_code: "X".into(), score: 78.5, extra: HashMap::new() },
        ];
        let out = postprocess_l2(results);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 78.5);
    }

    #[test]
    fn l2_ties_break_first_writer() {
        let results = vec![
            L2PredictResult { admission_code: "X".into(), score: 80.0, extra: HashMap::new() },
            L2PredictResult { admission_code: "X".into(), score: 80.0, extra: HashMap::new() },
        ];
        let out = postprocess_l2(results);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 80.0);
    }

    #[test]
    fn l1_coalesces_max_score_across_priority_types() {
        let mut scores_a = HashMap::new();
        scores_a.insert("7480201".to_string(), 20.0);
        let mut scores_b = HashMap::new();
        scores_b.insert("7480201".to_string(), 25.0);
        let results = vec![
            L1PredictResult { priority_type: "p1".into(), scores: scores_a },
            L1PredictResult { priority_type: "p2".into(), scores: scores_b },
        ];
        let out = postprocess_l1(results);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority_type, "p2");
        assert_eq!(out[0].scores["7480201"], 25.0);
    }

    #[test]
    fn l3_drops_empty_results_and_dedups_by_signature() {
        let entry = L3MajorEntry { major_code: "7480201".into(), major_group: "A00".into(), extra: HashMap::new() };
        let populated = L3PredictResult { result: HashMap::from([("DHBK".to_string(), vec![entry.clone()])]) };
        let duplicate = L3PredictResult { result: HashMap::from([("DHBK".to_string(), vec![entry])]) };
        let empty = L3PredictResult { result: HashMap::new() };

        let out = postprocess_l3(vec![populated, duplicate, empty]);
        assert_eq!(out.len(), 1);
    }
}
