//! L3 (transcript-based) expansion: english-cert x intl-cert x aptitude x
//! major cross product, with a transcript record built by source priority
//! (§4.5 L3).

use crate::domain::catalog::{conduct_rank, major_code_table, performance_rank};
use crate::domain::profile::{ActiveFile, Award, ExamType, StudentProfile, TranscriptRecord};
use crate::domain::wire::{
    AwardQg, Dgnl, HocBaRow, L3NationalSubject, NangKhieuScore, Thpt, UserInputL3,
};
use crate::domain::catalog::Subject;
use crate::error::{EngineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Canonical national-exam subject order, used to pick THPT electives
/// deterministically (first two non-required subjects in this order).
const ELECTIVE_ORDER: &[Subject] = &[
    Subject::VatLy,
    Subject::HoaHoc,
    Subject::SinhHoc,
    Subject::LichSu,
    Subject::DiaLy,
    Subject::Gdcd,
    Subject::TiengAnh,
];

static GRADE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(10|11|12)\b").unwrap());
static SEMESTER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)semester\s*([1-2])").unwrap());

pub fn expand(profile: &StudentProfile, active_files: &[ActiveFile]) -> Result<Vec<UserInputL3>> {
    profile.validate()?;

    let thpt = build_thpt(profile)?;
    let hoc_ba = build_transcript(profile, active_files)?;
    let award_qg = build_award(profile);
    let (english_options, intl_options, dgnl_options) = build_cert_options(profile);
    let majors = major_code_table();

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for major_name in &profile.candidate_majors {
        let Some(code) = majors.get(major_name.as_str()) else { continue };
        for english in &english_options {
            for intl in &intl_options {
                for dgnl in &dgnl_options {
                    let input = UserInputL3 {
                        nhom_nganh: (*code).to_string(),
                        tinh_tp: profile.province.clone(),
                        hoc_phi: profile.max_budget,
                        cong_lap: profile.public_flag(),
                        thpt: thpt.clone(),
                        hoc_ba: hoc_ba.clone(),
                        award_qg: award_qg.clone(),
                        award_english: english.clone(),
                        int_cer: intl.clone(),
                        dgnl: dgnl.clone(),
                    };
                    let signature = canonical_signature(&input);
                    if seen.insert(signature) {
                        out.push(input);
                    }
                }
            }
        }
    }

    Ok(out)
}

fn build_thpt(profile: &StudentProfile) -> Result<Thpt> {
    let ngu_van = *profile
        .national_exam
        .get(&Subject::NguVan)
        .ok_or_else(|| EngineError::invalid_input("THPT requires a literature score"))?;
    let toan = *profile
        .national_exam
        .get(&Subject::Toan)
        .ok_or_else(|| EngineError::invalid_input("THPT requires a math score"))?;

    let electives: Vec<L3NationalSubject> = ELECTIVE_ORDER
        .iter()
        .filter_map(|s| profile.national_exam.get(s).map(|score| L3NationalSubject {
            subject: s.code().to_string(),
            score: *score,
        }))
        .take(2)
        .collect();

    if electives.len() < 2 {
        return Err(EngineError::invalid_input(
            "THPT requires at least 2 elective subjects beyond literature and math",
        ));
    }

    Ok(Thpt {
        ngu_van,
        toan,
        elective_1: electives[0].clone(),
        elective_2: electives[1].clone(),
    })
}

/// Builds the transcript record by source priority: structured
/// transcripts-with-grade, then OCR-derived files, then manual files.
fn build_transcript(profile: &StudentProfile, files: &[ActiveFile]) -> Result<Vec<HocBaRow>> {
    if profile.has_coherent_transcripts() {
        return Ok(rows_from_transcripts(profile, &profile.transcripts));
    }
    if let Some(rows) = rows_from_ocr_files(profile, files) {
        return Ok(rows);
    }
    if let Some(rows) = rows_from_manual_files(profile, files) {
        return Ok(rows);
    }
    Err(EngineError::invalid_input(
        "no coherent transcript source available (structured, OCR, or manual)",
    ))
}

fn rows_from_transcripts(profile: &StudentProfile, transcripts: &[TranscriptRecord]) -> Vec<HocBaRow> {
    let mut by_grade: HashMap<u8, Vec<&TranscriptRecord>> = HashMap::new();
    for t in transcripts {
        by_grade.entry(t.grade).or_default().push(t);
    }
    let mut rows: Vec<HocBaRow> = by_grade
        .into_iter()
        .map(|(grade, records)| averaged_row(profile, grade, &records))
        .collect();
    rows.sort_by_key(|r| r.grade);
    rows
}

/// Averages every subject score present across this grade's transcript
/// record(s) — not a single fixed subject — matching the OCR path's own
/// whole-`ocr_scores` average below.
fn averaged_row(profile: &StudentProfile, grade: u8, records: &[&TranscriptRecord]) -> HocBaRow {
    let scores: Vec<f64> = records.iter().flat_map(|r| r.scores.values().copied()).collect();
    let avg = if scores.is_empty() {
        None
    } else {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Some((mean.clamp(0.0, 10.0) * 100.0).round() / 100.0)
    };
    let label = standing_label(profile, grade);

    HocBaRow {
        grade,
        hk10: if grade == 10 { avg } else { None },
        hk11: if grade == 11 { avg } else { None },
        hk12: if grade == 12 { avg } else { None },
        hl10: if grade == 10 { label.clone() } else { None },
        hl11: if grade == 11 { label.clone() } else { None },
        hl12: if grade == 12 { label } else { None },
    }
}

/// Accepted only when the *entire* file set is uniformly OCR'd — a mixed
/// set must fall through to the manual-files source instead of silently
/// discarding the non-OCR half.
fn rows_from_ocr_files(profile: &StudentProfile, files: &[ActiveFile]) -> Option<Vec<HocBaRow>> {
    if files.len() != 3 && files.len() != 6 {
        return None;
    }
    if !files.iter().all(|f| f.has_ocr_result) {
        return None;
    }
    let mut rows = Vec::new();
    for file in files {
        let grade = detect_grade(file)?;
        let avg = file.ocr_scores.values().copied().sum::<f64>() / file.ocr_scores.len().max(1) as f64;
        let clamped = (avg.clamp(0.0, 10.0) * 100.0).round() / 100.0;
        let label = standing_label(profile, grade);
        rows.push(HocBaRow {
            grade,
            hk10: if grade == 10 { Some(clamped) } else { None },
            hk11: if grade == 11 { Some(clamped) } else { None },
            hk12: if grade == 12 { Some(clamped) } else { None },
            hl10: if grade == 10 { label.clone() } else { None },
            hl11: if grade == 11 { label.clone() } else { None },
            hl12: if grade == 12 { label } else { None },
        });
    }
    Some(rows)
}

/// Accepted only when the entire file set is uniformly non-OCR'd — the
/// mirror image of `rows_from_ocr_files`'s uniformity check.
fn rows_from_manual_files(profile: &StudentProfile, files: &[ActiveFile]) -> Option<Vec<HocBaRow>> {
    if files.len() != 3 && files.len() != 6 {
        return None;
    }
    if files.iter().any(|f| f.has_ocr_result) {
        return None;
    }
    let mut rows = Vec::new();
    for file in files {
        let grade = detect_grade(file)?;
        let label = standing_label(profile, grade);
        rows.push(HocBaRow {
            grade,
            hk10: None,
            hk11: None,
            hk12: None,
            hl10: if grade == 10 { label.clone() } else { None },
            hl11: if grade == 11 { label.clone() } else { None },
            hl12: if grade == 12 { label } else { None },
        });
    }
    Some(rows)
}

/// Encodes a grade's academic-performance and conduct standing as the
/// `hl1X` wire value: `"{performanceRank}.{conductRank}"` when both are
/// declared for that grade, or just the performance rank when conduct is
/// absent. `None` when the student declared no performance standing for
/// this grade at all.
fn standing_label(profile: &StudentProfile, grade: u8) -> Option<String> {
    let performance = *profile.standing.performance.get(&grade)?;
    match profile.standing.conduct.get(&grade) {
        Some(conduct) => Some(format!("{}.{}", performance_rank(performance), conduct_rank(*conduct))),
        None => Some(performance_rank(performance).to_string()),
    }
}

/// Scans fileName, description, tags, original fileName in that order for
/// the first `\b(10|11|12)\b` match.
fn detect_grade(file: &ActiveFile) -> Option<u8> {
    let candidates = [
        file.file_name.as_str(),
        file.description.as_str(),
        &file.tags.join(" "),
        file.original_file_name.as_str(),
    ];
    for text in candidates {
        if let Some(cap) = GRADE_PATTERN.captures(text) {
            return cap.get(1)?.as_str().parse().ok();
        }
    }
    None
}

#[allow(dead_code)]
fn detect_semester(file: &ActiveFile) -> Option<u8> {
    let candidates = [
        file.file_name.as_str(),
        file.description.as_str(),
        &file.tags.join(" "),
        file.original_file_name.as_str(),
    ];
    for text in candidates {
        if let Some(cap) = SEMESTER_PATTERN.captures(text) {
            return cap.get(1)?.as_str().parse().ok();
        }
    }
    None
}

fn build_award(profile: &StudentProfile) -> Option<AwardQg> {
    let award = profile.awards.first()?;
    let level = l3_award_level(award)?;
    Some(AwardQg { subject: award.category.code().to_string(), level })
}

/// L3's award-level mapping differs from L1's: consolation carries an
/// explicit level here rather than being dropped.
fn l3_award_level(award: &Award) -> Option<u8> {
    use crate::domain::catalog::AwardRank;
    match award.rank {
        AwardRank::First => Some(1),
        AwardRank::Second => Some(2),
        AwardRank::Third => Some(3),
        AwardRank::Consolation => Some(4),
    }
}

/// English / intl / DGNL are independent option lists; a missing category
/// yields a single `None` slot rather than zero options (so the cross
/// product is never empty solely because one category is absent).
fn build_cert_options(
    profile: &StudentProfile,
) -> (Vec<Option<NangKhieuScore>>, Vec<Option<NangKhieuScore>>, Vec<Option<Dgnl>>) {
    let mut english: Vec<Option<NangKhieuScore>> = profile
        .certifications
        .iter()
        .filter(|c| c.exam_type == ExamType::Ccnn && c.cefr_level.is_some())
        .map(|c| {
            Some(NangKhieuScore {
                cer_type: "CCNN".to_string(),
                score: cefr_numeric(c.cefr_level.as_deref().unwrap_or_default()),
            })
        })
        .collect();
    if english.is_empty() {
        english.push(None);
    }

    let mut intl: Vec<Option<NangKhieuScore>> = profile
        .certifications
        .iter()
        .filter(|c| c.exam_type == ExamType::Ccqt)
        .filter_map(|c| {
            let ty = c.ccqt_type?;
            let score = crate::domain::catalog::ccqt_scale(ty, &c.level)?;
            Some(Some(NangKhieuScore { cer_type: "CCQT".to_string(), score }))
        })
        .collect();
    if intl.is_empty() {
        intl.push(None);
    }

    let mut dgnl: Vec<Option<Dgnl>> = profile
        .aptitude
        .iter()
        .filter(|a| a.exam_type == ExamType::Vnuhcm)
        .filter_map(|a| {
            Some(Some(Dgnl {
                component_1: *a.components.get("component_1")?,
                component_2: *a.components.get("component_2")?,
                component_3: *a.components.get("component_3")?,
            }))
        })
        .collect();
    if dgnl.is_empty() {
        dgnl.push(None);
    }

    (english, intl, dgnl)
}

fn cefr_numeric(level: &str) -> f64 {
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

fn canonical_signature(input: &UserInputL3) -> String {
    serde_json::to_string(input).unwrap_or_default()
}
