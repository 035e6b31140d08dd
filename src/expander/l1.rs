//! L1 (priority-based) expansion: award x major cross product (§4.5 L1).

use crate::domain::catalog::{major_code_table, AwardRank};
use crate::domain::profile::StudentProfile;
use crate::domain::wire::UserInputL1;
use crate::error::{EngineError, Result};

/// Expands a profile into the L1 request-input list. Returns
/// `InvalidInput` only through the shared profile invariants — an expander
/// that maps to zero majors yields an empty list, left to the pipeline
/// orchestrator to reject (§4.9 step 2).
pub fn expand(profile: &StudentProfile) -> Result<Vec<UserInputL1>> {
    profile.validate()?;

    let templates = award_templates(profile);
    let majors = major_code_table();

    let mut out = Vec::new();
    for major_name in &profile.candidate_majors {
        let Some(code) = majors.get(major_name.as_str()) else { continue };
        for tmpl in &templates {
            out.push(UserInputL1 {
                nhom_nganh: (*code).to_string(),
                tinh_tp: profile.province.clone(),
                hoc_phi: profile.max_budget,
                cong_lap: profile.public_flag(),
                hsg_1: tmpl.0.clone(),
                hsg_2: tmpl.1.clone(),
                hsg_3: tmpl.2.clone(),
                haimuoi_huyen_ngheo_tnb: profile.ethnic_minority_southern as u8,
                dan_toc_thieu_so: profile.very_few_ethnic_minority as u8,
                ahld: profile.heroes_and_contributors as u8,
            });
        }
    }
    Ok(out)
}

/// One `(hsg_1, hsg_2, hsg_3)` template per award (ignoring consolation),
/// or a single all-zero template when the student has no qualifying award.
fn award_templates(profile: &StudentProfile) -> Vec<(String, String, String)> {
    let qualifying: Vec<_> = profile
        .awards
        .iter()
        .filter(|a| a.rank != AwardRank::Consolation)
        .collect();

    if qualifying.is_empty() {
        return vec![("0".to_string(), "0".to_string(), "0".to_string())];
    }

    qualifying
        .into_iter()
        .map(|award| {
            let code = award.category.code().to_string();
            match award.rank {
                AwardRank::First => (code, "0".to_string(), "0".to_string()),
                AwardRank::Second => ("0".to_string(), code, "0".to_string()),
                AwardRank::Third => ("0".to_string(), "0".to_string(), code),
                AwardRank::Consolation => unreachable!("filtered above"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Subject;
    use crate::domain::profile::{Award, GradeStanding};
    use std::collections::HashMap;

    fn profile_with_awards(awards: Vec<Award>, majors: Vec<&str>) -> StudentProfile {
        StudentProfile {
            id: "s1".into(),
            user_id: None,
            awards,
            certifications: vec![],
            national_exam: HashMap::new(),
            vsat: HashMap::new(),
            talent: HashMap::new(),
            aptitude: vec![],
            transcripts: vec![],
            standing: GradeStanding::default(),
            province: "HCM".into(),
            min_budget: 0.0,
            max_budget: 50.0,
            public_only: Some(true),
            candidate_majors: majors.into_iter().map(String::from).collect(),
            ethnic_minority_southern: false,
            very_few_ethnic_minority: false,
            heroes_and_contributors: false,
        }
    }

    #[test]
    fn seed_scenario_3_two_awards_one_major() {
        let profile = profile_with_awards(
            vec![
                Award { category: Subject::Toan, rank: AwardRank::First },
                Award { category: Subject::VatLy, rank: AwardRank::Third },
            ],
            vec!["Công nghệ thông tin"],
        );
        let inputs = expand(&profile).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().any(|i| i.hsg_1 == "TOAN" && i.hsg_2 == "0" && i.hsg_3 == "0"));
        assert!(inputs.iter().any(|i| i.hsg_1 == "0" && i.hsg_2 == "0" && i.hsg_3 == "VAT_LY"));
        assert!(inputs.iter().all(|i| i.nhom_nganh == "7480201"));
    }

    #[test]
    fn no_awards_emits_single_zero_template_per_major() {
        let profile = profile_with_awards(vec![], vec!["Kế toán"]);
        let inputs = expand(&profile).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].hsg_1, "0");
        assert_eq!(inputs[0].hsg_2, "0");
        assert_eq!(inputs[0].hsg_3, "0");
    }

    #[test]
    fn unmapped_major_is_dropped_not_errored() {
        let profile = profile_with_awards(vec![], vec!["Not A Real Major"]);
        let inputs = expand(&profile).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn consolation_awards_are_ignored() {
        let profile = profile_with_awards(
            vec![Award { category: Subject::Toan, rank: AwardRank::Consolation }],
            vec!["Kế toán"],
        );
        let inputs = expand(&profile).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].hsg_1, "0");
    }
}
