//! The student profile and the invariants the expanders enforce on it.

use crate::domain::catalog::{AwardRank, CcqtType, ConductLabel, PerformanceLabel, Subject};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamType {
    Ccnn,
    Ccqt,
    Dgnl,
    Vnuhcm,
}

#[derive(Debug, Clone)]
pub struct Award {
    pub category: Subject,
    pub rank: AwardRank,
}

#[derive(Debug, Clone)]
pub struct Certification {
    pub exam_type: ExamType,
    pub level: String,
    /// Present only for certificates with a CEFR-equivalent scale.
    pub cefr_level: Option<String>,
    /// CCQT sub-type (ACT/IB/SAT/...); set only when `exam_type == Ccqt`.
    pub ccqt_type: Option<CcqtType>,
    /// JLPT level string, set only when this is a JLPT-handled CCNN cert.
    pub jlpt_level: Option<String>,
}

/// One semester or full-year transcript row for a single grade.
#[derive(Debug, Clone)]
pub struct TranscriptRecord {
    pub grade: u8,
    pub semester: Option<u8>,
    pub scores: HashMap<Subject, f64>,
}

#[derive(Debug, Clone)]
pub struct ActiveFile {
    pub file_name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub original_file_name: String,
    pub has_ocr_result: bool,
    pub ocr_scores: HashMap<Subject, f64>,
}

/// Per-grade academic performance & conduct, required by several pipelines.
#[derive(Debug, Clone, Default)]
pub struct GradeStanding {
    pub performance: HashMap<u8, PerformanceLabel>,
    pub conduct: HashMap<u8, ConductLabel>,
}

#[derive(Debug, Clone)]
pub struct AptitudeScore {
    pub exam_type: ExamType,
    /// Keyed component name (e.g. for VNUHCM's three-component DGNL).
    pub components: HashMap<String, f64>,
}

/// Read-only student profile as retrieved from the repository.
#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: String,
    pub user_id: Option<String>,
    pub awards: Vec<Award>,
    pub certifications: Vec<Certification>,
    /// National-exam subject -> score. Must be empty or exactly 4 entries.
    pub national_exam: HashMap<Subject, f64>,
    /// Exactly 3 entries when present, subjects from the national set.
    pub vsat: HashMap<Subject, f64>,
    pub talent: HashMap<Subject, f64>,
    pub aptitude: Vec<AptitudeScore>,
    pub transcripts: Vec<TranscriptRecord>,
    pub standing: GradeStanding,
    pub province: String,
    pub min_budget: f64,
    pub max_budget: f64,
    pub public_only: Option<bool>,
    pub candidate_majors: Vec<String>,
    pub ethnic_minority_southern: bool,
    pub very_few_ethnic_minority: bool,
    pub heroes_and_contributors: bool,
}

impl StudentProfile {
    /// Enforces spec-level structural invariants, failing with
    /// `InvalidInput` per §3. Called once per pipeline invocation before
    /// expansion.
    pub fn validate(&self) -> Result<()> {
        if !self.national_exam.is_empty() && self.national_exam.len() != 4 {
            return Err(EngineError::invalid_input(
                "national exam data must contain exactly 4 subjects when present",
            ));
        }
        if !self.vsat.is_empty() && self.vsat.len() != 3 {
            return Err(EngineError::invalid_input(
                "VSAT data must contain exactly 3 entries when present",
            ));
        }
        if self.min_budget < 0.0 || self.min_budget > self.max_budget {
            return Err(EngineError::invalid_input(
                "budget range must satisfy 0 <= minBudget <= maxBudget",
            ));
        }
        self.validate_transcript_coherence()?;
        Ok(())
    }

    /// Either exactly 3 full-year records (no semester) or exactly 6
    /// semester records (two per grade, three grades). Mixing is rejected.
    fn validate_transcript_coherence(&self) -> Result<()> {
        if self.transcripts.is_empty() {
            return Ok(());
        }
        let full_year = self.transcripts.iter().filter(|t| t.semester.is_none()).count();
        let semester = self.transcripts.iter().filter(|t| t.semester.is_some()).count();
        let coherent = (full_year == 3 && semester == 0) || (full_year == 0 && semester == 6);
        if !coherent {
            return Err(EngineError::invalid_input(
                "transcript data must be exactly 3 full-year or 6 semester records, not mixed",
            ));
        }
        Ok(())
    }

    /// True if the transcript set forms a coherent record per
    /// `validate_transcript_coherence`, without raising an error — used by
    /// the L3 expander's transcript-priority fallback, which treats
    /// incoherence as "this source is unavailable" rather than terminal.
    pub fn has_coherent_transcripts(&self) -> bool {
        self.validate_transcript_coherence().is_ok() && !self.transcripts.is_empty()
    }

    pub fn public_flag(&self) -> Option<u8> {
        self.public_only.map(|p| if p { 1 } else { 0 })
    }
}

/// Pipeline-facing student identity, mirrors `(studentId, userId|null)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub student_id: String,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_profile() -> StudentProfile {
        StudentProfile {
            id: "s1".into(),
            user_id: None,
            awards: vec![],
            certifications: vec![],
            national_exam: HashMap::new(),
            vsat: HashMap::new(),
            talent: HashMap::new(),
            aptitude: vec![],
            transcripts: vec![],
            standing: GradeStanding::default(),
            province: "HCM".into(),
            min_budget: 0.0,
            max_budget: 100.0,
            public_only: None,
            candidate_majors: vec![],
            ethnic_minority_southern: false,
            very_few_ethnic_minority: false,
            heroes_and_contributors: false,
        }
    }

    #[test]
    fn empty_profile_is_valid() {
        assert!(base_profile().validate().is_ok());
    }

    #[test]
    fn rejects_wrong_national_exam_count() {
        let mut p = base_profile();
        p.national_exam.insert(Subject::Toan, 8.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_inverted_budget() {
        let mut p = base_profile();
        p.min_budget = 50.0;
        p.max_budget = 10.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_mixed_transcript_modes() {
        let mut p = base_profile();
        p.transcripts.push(TranscriptRecord { grade: 10, semester: None, scores: HashMap::new() });
        p.transcripts.push(TranscriptRecord { grade: 11, semester: Some(1), scores: HashMap::new() });
        p.transcripts.push(TranscriptRecord { grade: 11, semester: Some(2), scores: HashMap::new() });
        p.transcripts.push(TranscriptRecord { grade: 12, semester: None, scores: HashMap::new() });
        assert!(p.validate().is_err());
    }

    #[test]
    fn accepts_six_semester_transcripts() {
        let mut p = base_profile();
        for grade in [10u8, 11, 12] {
            for sem in [1u8, 2] {
                p.transcripts.push(TranscriptRecord { grade, semester: Some(sem), scores: HashMap::new() });
            }
        }
        assert!(p.validate().is_ok());
    }
}
