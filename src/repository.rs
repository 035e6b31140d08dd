//! Read-only data repository interface (§6): student profiles and their
//! active files (OCR transcript sources), consumed but not owned by the
//! engine.

use crate::domain::profile::{ActiveFile, StudentProfile};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_student(&self, id: &str, user_id: Option<&str>) -> Result<Option<StudentProfile>>;
    async fn find_active_files(&self, student_id: &str) -> Result<Vec<ActiveFile>>;
}

/// An in-memory `StudentRepository`, for tests and local experimentation.
/// Not wired to any persistent store — persistence of students is out of
/// scope for this engine.
#[derive(Default)]
pub struct StaticRepository {
    profiles: HashMap<String, StudentProfile>,
    files: HashMap<String, Vec<ActiveFile>>,
}

impl StaticRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: StudentProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    pub fn with_files(mut self, student_id: impl Into<String>, files: Vec<ActiveFile>) -> Self {
        self.files.insert(student_id.into(), files);
        self
    }
}

#[async_trait]
impl StudentRepository for StaticRepository {
    async fn find_student(&self, id: &str, user_id: Option<&str>) -> Result<Option<StudentProfile>> {
        let Some(profile) = self.profiles.get(id) else { return Ok(None) };
        if let Some(expected) = user_id {
            if profile.user_id.as_deref() != Some(expected) {
                return Ok(None);
            }
        }
        Ok(Some(profile.clone()))
    }

    async fn find_active_files(&self, student_id: &str) -> Result<Vec<ActiveFile>> {
        Ok(self.files.get(student_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::GradeStanding;
    use std::collections::HashMap as Map;

    fn profile(id: &str) -> StudentProfile {
        StudentProfile {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            awards: vec![],
            certifications: vec![],
            national_exam: Map::new(),
            vsat: Map::new(),
            talent: Map::new(),
            aptitude: vec![],
            transcripts: vec![],
            standing: GradeStanding::default(),
            province: "HCM".into(),
            min_budget: 0.0,
            max_budget: 50.0,
            public_only: None,
            candidate_majors: vec![],
            ethnic_minority_southern: false,
            very_few_ethnic_minority: false,
            heroes_and_contributors: false,
        }
    }

    #[tokio::test]
    async fn finds_known_student_by_id_and_owner() {
        let repo = StaticRepository::new().with_profile(profile("s1"));
        let found = repo.find_student("s1", Some("u1")).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn rejects_wrong_owner() {
        let repo = StaticRepository::new().with_profile(profile("s1"));
        let found = repo.find_student("s1", Some("someone-else")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn unknown_student_returns_none() {
        let repo = StaticRepository::new();
        let found = repo.find_student("missing", None).await.unwrap();
        assert!(found.is_none());
    }
}
