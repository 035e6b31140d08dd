//! L2 (exam-based) expansion: exam-scenario x language-cert x major cross
//! product (§4.5 L2).

use crate::domain::catalog::{
    ccqt_scale, conduct_rank, formable_groups, group_by_code, major_code_table, performance_rank,
    CcqtType, Subject, VSAT_WHITELIST,
};
use crate::domain::profile::{ExamType, StudentProfile};
use crate::domain::wire::UserInputL2;
use crate::error::{EngineError, Result};
use tracing::debug;

/// A `(groupCode, score)` pair representing one hypothetical admission
/// basis, tagged with the source it came from (observability only).
#[derive(Debug, Clone)]
struct Scenario {
    group_code: String,
    score: f64,
}

/// One language-certificate bucket: a display name and its bucket score.
#[derive(Debug, Clone)]
struct CertBucket {
    ten_ccta: String,
    diem_ccta: f64,
}

pub fn expand(profile: &StudentProfile) -> Result<Vec<UserInputL2>> {
    profile.validate()?;
    require_standing(profile)?;

    let scenarios = collect_scenarios(profile);
    let cert_buckets = collect_cert_buckets(profile);
    let majors = major_code_table();

    let mut out = Vec::new();
    for major_name in &profile.candidate_majors {
        let Some(code) = majors.get(major_name.as_str()) else { continue };
        for scenario in &scenarios {
            if cert_buckets.is_empty() {
                out.push(build_input(profile, code, scenario, None));
            } else {
                for bucket in &cert_buckets {
                    out.push(build_input(profile, code, scenario, Some(bucket)));
                }
            }
        }
    }

    out.sort_by(|a, b| a.to_hop_mon.cmp(&b.to_hop_mon));
    Ok(out)
}

fn build_input(
    profile: &StudentProfile,
    major_code: &str,
    scenario: &Scenario,
    bucket: Option<&CertBucket>,
) -> UserInputL2 {
    UserInputL2 {
        nhom_nganh: major_code.to_string(),
        tinh_tp: profile.province.clone(),
        hoc_phi: profile.max_budget,
        cong_lap: profile.public_flag(),
        to_hop_mon: scenario.group_code.clone(),
        diem_chuan: scenario.score,
        diem_ccta: bucket.map(|b| b.diem_ccta),
        ten_ccta: bucket.map(|b| b.ten_ccta.clone()),
    }
}

/// Per spec §4.5 L2 step 1: academic performance and conduct for grades 10,
/// 11, 12 each map via the fixed enum→rank tables, missing grade ⇒
/// `InvalidInput`. Exempted when the student declared no standing at all —
/// an explicit carve-out for students relying purely on exam scenarios; see
/// DESIGN.md's Open Question decisions.
fn require_standing(profile: &StudentProfile) -> Result<()> {
    if profile.standing.performance.is_empty() && profile.standing.conduct.is_empty() {
        return Ok(());
    }
    for grade in [10u8, 11, 12] {
        let performance = profile.standing.performance.get(&grade).ok_or_else(|| {
            EngineError::invalid_input(format!("missing performance standing for grade {grade}"))
        })?;
        let conduct = profile.standing.conduct.get(&grade).ok_or_else(|| {
            EngineError::invalid_input(format!("missing conduct standing for grade {grade}"))
        })?;
        debug!(
            grade,
            performance_rank = performance_rank(*performance),
            conduct_rank = conduct_rank(*conduct),
            "grade standing mapped to rank"
        );
    }
    Ok(())
}

fn collect_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    scenarios.extend(national_scenarios(profile));
    scenarios.extend(vsat_scenarios(profile));
    scenarios.extend(dgnl_scenarios(profile));
    scenarios.extend(ccqt_scenarios(profile));
    scenarios.extend(talent_scenarios(profile));
    scenarios
}

fn national_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    let available = |s: Subject| profile.national_exam.contains_key(&s);
    formable_groups(available)
        .into_iter()
        .map(|g| Scenario {
            group_code: g.code.to_string(),
            score: g.subjects.iter().map(|s| profile.national_exam[s]).sum(),
        })
        .collect()
}

fn vsat_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    if profile.vsat.is_empty() {
        return vec![];
    }
    VSAT_WHITELIST
        .iter()
        .filter_map(|code| group_by_code(code))
        .filter(|g| g.subjects.iter().all(|s| profile.vsat.contains_key(s)))
        .map(|g| Scenario {
            group_code: g.code.to_string(),
            score: g.subjects.iter().map(|s| profile.vsat[s]).sum(),
        })
        .collect()
}

fn dgnl_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    profile
        .aptitude
        .iter()
        .filter(|a| a.exam_type == ExamType::Dgnl)
        .filter_map(|a| {
            let score: f64 = a.components.values().sum();
            Some(Scenario { group_code: "DGNL".to_string(), score })
        })
        .collect()
}

fn ccqt_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    profile
        .certifications
        .iter()
        .filter_map(|cert| {
            let ccqt_type = cert.ccqt_type?;
            let score = ccqt_scale(ccqt_type, &cert.level)?;
            Some(Scenario { group_code: ccqt_group_label(ccqt_type), score })
        })
        .collect()
}

fn ccqt_group_label(ty: CcqtType) -> String {
    match ty {
        CcqtType::Act => "ACT",
        CcqtType::Ib => "IB",
        CcqtType::Ossd => "OSSD",
        CcqtType::Sat => "SAT",
        CcqtType::Duolingo => "DUOLINGO",
        CcqtType::PteAcademic => "PTE",
        CcqtType::ALevel => "A_LEVEL",
    }
    .to_string()
}

fn talent_scenarios(profile: &StudentProfile) -> Vec<Scenario> {
    if profile.talent.is_empty() {
        return vec![];
    }
    // National takes precedence on conflict: combine talent with national,
    // national overriding.
    let mut combined = profile.talent.clone();
    for (subject, score) in &profile.national_exam {
        combined.insert(*subject, *score);
    }
    let has_talent_subject = |s: Subject| profile.talent.contains_key(&s);
    let available = |s: Subject| combined.contains_key(&s);

    formable_groups(available)
        .into_iter()
        .filter(|g| g.subjects.iter().any(|s| has_talent_subject(*s)))
        .map(|g| Scenario {
            group_code: g.code.to_string(),
            score: g.subjects.iter().map(|s| combined[s]).sum(),
        })
        .collect()
}

/// CCNN certificates split into JLPT and CEFR-capable buckets; each bucket
/// independently cross-products with scenarios and majors.
fn collect_cert_buckets(profile: &StudentProfile) -> Vec<CertBucket> {
    let mut buckets = Vec::new();
    for cert in &profile.certifications {
        if cert.exam_type != ExamType::Ccnn {
            continue;
        }
        if let Some(jlpt) = &cert.jlpt_level {
            buckets.push(CertBucket { ten_ccta: "JLPT".to_string(), diem_ccta: jlpt_score(jlpt) });
        } else if let Some(cefr) = &cert.cefr_level {
            buckets.push(CertBucket { ten_ccta: "CEFR".to_string(), diem_ccta: cefr_score(cefr) });
        }
    }
    buckets
}

fn jlpt_score(level: &str) -> f64 {
    match level {
        "N1" => 5.0,
        "N2" => 4.0,
        "N3" => 3.0,
        "N4" => 2.0,
        "N5" => 1.0,
        _ => 0.0,
    }
}

fn cefr_score(level: &str) -> f64 {
    match level {
        "C2" => 6.0,
        "C1" => 5.0,
        "B2" => 4.0,
        "B1" => 3.0,
        "A2" => 2.0,
        "A1" => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Certification, GradeStanding};
    use std::collections::HashMap;

    fn empty_profile() -> StudentProfile {
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
            max_budget: 50.0,
            public_only: None,
            candidate_majors: vec!["Kế toán".to_string()],
            ethnic_minority_southern: false,
            very_few_ethnic_minority: false,
            heroes_and_contributors: false,
        }
    }

    #[test]
    fn empty_sources_yields_empty_list() {
        let profile = empty_profile();
        let inputs = expand(&profile).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn results_are_sorted_by_to_hop_mon() {
        let mut profile = empty_profile();
        profile.national_exam.insert(Subject::Toan, 8.0);
        profile.national_exam.insert(Subject::VatLy, 7.0);
        profile.national_exam.insert(Subject::HoaHoc, 6.0);
        profile.national_exam.insert(Subject::TiengAnh, 9.0);
        let inputs = expand(&profile).unwrap();
        let codes: Vec<_> = inputs.iter().map(|i| i.to_hop_mon.clone()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn vsat_respects_whitelist() {
        let mut profile = empty_profile();
        profile.vsat.insert(Subject::Toan, 100.0);
        profile.vsat.insert(Subject::HoaHoc, 90.0);
        profile.vsat.insert(Subject::SinhHoc, 80.0);
        let inputs = expand(&profile).unwrap();
        // B00 = Toan/HoaHoc/SinhHoc is formable but not whitelisted for VSAT.
        assert!(inputs.iter().all(|i| i.to_hop_mon != "B00"));
    }

    #[test]
    fn partial_standing_missing_a_grade_is_invalid_input() {
        use crate::domain::catalog::{ConductLabel, PerformanceLabel};
        let mut profile = empty_profile();
        profile.national_exam.insert(Subject::Toan, 8.0);
        profile.standing.performance.insert(10, PerformanceLabel::Gioi);
        profile.standing.conduct.insert(10, ConductLabel::Tot);
        // Grades 11/12 are absent: with any standing declared, every grade
        // in 10/11/12 must be present.
        assert!(expand(&profile).is_err());
    }

    #[test]
    fn complete_standing_across_all_grades_succeeds() {
        use crate::domain::catalog::{ConductLabel, PerformanceLabel};
        let mut profile = empty_profile();
        profile.national_exam.insert(Subject::Toan, 8.0);
        profile.national_exam.insert(Subject::VatLy, 7.0);
        profile.national_exam.insert(Subject::HoaHoc, 6.0);
        profile.national_exam.insert(Subject::TiengAnh, 9.0);
        for grade in [10u8, 11, 12] {
            profile.standing.performance.insert(grade, PerformanceLabel::Kha);
            profile.standing.conduct.insert(grade, ConductLabel::Tot);
        }
        assert!(expand(&profile).is_ok());
    }

    #[test]
    fn ccqt_act_boundary_emits_scenario() {
        let mut profile = empty_profile();
        profile.certifications.push(Certification {
            exam_type: ExamType::Ccqt,
            level: "36".to_string(),
            cefr_level: None,
            ccqt_type: Some(CcqtType::Act),
            jlpt_level: None,
        });
        let inputs = expand(&profile).unwrap();
        assert!(inputs.iter().any(|i| i.to_hop_mon == "ACT" && i.diem_chuan == 36.0));
    }
}
