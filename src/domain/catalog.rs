//! Fixed lookup tables: subject-group catalog, HSG/CCQT enums, major-name
//! mapping, and the academic-performance/conduct rank tables. These mirror
//! the wire contract bit-exact (§6) — do not rename variants casually.

use std::collections::HashMap;

/// A national-curriculum subject, used both in the national-exam score map
/// and as an HSG award subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Toan,
    NguVan,
    VatLy,
    HoaHoc,
    SinhHoc,
    LichSu,
    DiaLy,
    Gdcd,
    TiengAnh,
}

impl Subject {
    /// Wire code used for HSG award slots and national-exam score keys.
    pub fn code(self) -> &'static str {
        match self {
            Subject::Toan => "TOAN",
            Subject::NguVan => "NGU_VAN",
            Subject::VatLy => "VAT_LY",
            Subject::HoaHoc => "HOA_HOC",
            Subject::SinhHoc => "SINH_HOC",
            Subject::LichSu => "LICH_SU",
            Subject::DiaLy => "DIA_LY",
            Subject::Gdcd => "GDCD",
            Subject::TiengAnh => "TIENG_ANH",
        }
    }
}

/// A subject-group (`to_hop_mon`) code and its ordered subject triple.
pub struct SubjectGroup {
    pub code: &'static str,
    pub subjects: [Subject; 3],
}

/// The fixed subject-group catalog. Order here is the iteration order used
/// when deriving scenarios from a subject-group source.
pub const SUBJECT_GROUPS: &[SubjectGroup] = &[
    SubjectGroup { code: "A00", subjects: [Subject::Toan, Subject::VatLy, Subject::HoaHoc] },
    SubjectGroup { code: "A01", subjects: [Subject::Toan, Subject::VatLy, Subject::TiengAnh] },
    SubjectGroup { code: "B00", subjects: [Subject::Toan, Subject::HoaHoc, Subject::SinhHoc] },
    SubjectGroup { code: "C00", subjects: [Subject::NguVan, Subject::LichSu, Subject::DiaLy] },
    SubjectGroup { code: "C01", subjects: [Subject::NguVan, Subject::Toan, Subject::VatLy] },
    SubjectGroup { code: "D01", subjects: [Subject::Toan, Subject::NguVan, Subject::TiengAnh] },
    SubjectGroup { code: "D07", subjects: [Subject::Toan, Subject::HoaHoc, Subject::TiengAnh] },
    SubjectGroup { code: "D10", subjects: [Subject::Toan, Subject::DiaLy, Subject::TiengAnh] },
];

/// Groups eligible as a VSAT scenario source. A group not in this whitelist
/// is never emitted as a VSAT scenario, even if formable from the VSAT triple.
pub const VSAT_WHITELIST: &[&str] = &["A00", "A01", "D01", "D07", "C01", "D10"];

/// Returns the catalog entry for a group code, if known.
pub fn group_by_code(code: &str) -> Option<&'static SubjectGroup> {
    SUBJECT_GROUPS.iter().find(|g| g.code == code)
}

/// Groups formable from a set of subjects that all carry a score.
pub fn formable_groups<'a>(available: impl Fn(Subject) -> bool) -> Vec<&'static SubjectGroup> {
    SUBJECT_GROUPS
        .iter()
        .filter(|g| g.subjects.iter().all(|s| available(*s)))
        .collect()
}

/// CCQT certificate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcqtType {
    Act,
    Ib,
    Ossd,
    Sat,
    Duolingo,
    PteAcademic,
    ALevel,
}

/// Scales a raw CCQT level string into `diem_chuan`, per the bit-exact scale
/// table. Returns `None` when the value is out of range / unrecognized, in
/// which case the scenario must be dropped rather than emitted.
pub fn ccqt_scale(ty: CcqtType, raw: &str) -> Option<f64> {
    match ty {
        CcqtType::Act => raw.parse::<i64>().ok().filter(|v| (1..=36).contains(v)).map(|v| v as f64),
        CcqtType::Ib => raw.parse::<i64>().ok().filter(|v| (0..=45).contains(v)).map(|v| v as f64),
        CcqtType::Ossd => raw.parse::<i64>().ok().filter(|v| (0..=100).contains(v)).map(|v| v as f64),
        CcqtType::Sat => raw.parse::<i64>().ok().filter(|v| (400..=1600).contains(v)).map(|v| v as f64),
        CcqtType::Duolingo => raw.parse::<i64>().ok().filter(|v| (10..=160).contains(v)).map(|v| v as f64),
        CcqtType::PteAcademic => raw.parse::<i64>().ok().filter(|v| (10..=90).contains(v)).map(|v| v as f64),
        CcqtType::ALevel => match raw {
            "A*" => Some(1.0),
            "A" => Some(0.9),
            "B" => Some(0.8),
            "C" => Some(0.7),
            "D" => Some(0.6),
            "E" => Some(0.5),
            "F" | "N" | "O" | "U" => Some(0.0),
            _ => None,
        },
    }
}

/// English-certificate handling bucket (L2 cert-bucket cross-product).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertBucket {
    Jlpt,
    Cefr,
}

/// CCNN (language certificate) wire enum, used for L3's `InterCerEnum`-style
/// intl-cert option list and L2's cert bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterCerType {
    Ccnn,
    Ccqt,
    Dgnl,
    Vnuhcm,
}

/// Academic-performance label. Ranked by `performance_rank` for L2's
/// per-grade presence check and for L3's `hl10`/`hl11`/`hl12` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLabel {
    Gioi,
    Kha,
    TrungBinh,
    Yeu,
    Kem,
}

pub fn performance_rank(label: PerformanceLabel) -> u8 {
    match label {
        PerformanceLabel::Gioi => 1,
        PerformanceLabel::Kha => 2,
        PerformanceLabel::TrungBinh => 3,
        PerformanceLabel::Yeu => 4,
        PerformanceLabel::Kem => 5,
    }
}

/// Conduct label, ranked the same way as performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConductLabel {
    Tot,
    Kha,
    TrungBinh,
    Yeu,
}

pub fn conduct_rank(label: ConductLabel) -> u8 {
    match label {
        ConductLabel::Tot => 1,
        ConductLabel::Kha => 2,
        ConductLabel::TrungBinh => 3,
        ConductLabel::Yeu => 4,
    }
}

/// Award rank, as recorded on a student's award list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardRank {
    First,
    Second,
    Third,
    Consolation,
}

/// Maps an award rank to its L3 numeric level; consolation has no level.
pub fn award_level(rank: AwardRank) -> Option<u8> {
    match rank {
        AwardRank::First => Some(1),
        AwardRank::Second => Some(2),
        AwardRank::Third => Some(3),
        AwardRank::Consolation => None,
    }
}

/// Fixed Vietnamese-major-name -> admission-code table. Majors not present
/// here are dropped during L1/L2/L3 expansion (never an `InvalidInput`).
pub fn major_code_table() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("Công nghệ thông tin", "7480201"),
        ("Khoa học máy tính", "7480101"),
        ("Kỹ thuật phần mềm", "7480103"),
        ("Quản trị kinh doanh", "7340101"),
        ("Kế toán", "7340301"),
        ("Ngôn ngữ Anh", "7220201"),
        ("Y khoa", "7720101"),
        ("Luật", "7380101"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a00_is_toan_vatly_hoahoc() {
        let g = group_by_code("A00").unwrap();
        assert_eq!(g.subjects, [Subject::Toan, Subject::VatLy, Subject::HoaHoc]);
    }

    #[test]
    fn ccqt_act_boundaries() {
        assert_eq!(ccqt_scale(CcqtType::Act, "36"), Some(36.0));
        assert_eq!(ccqt_scale(CcqtType::Act, "37"), None);
    }

    #[test]
    fn ccqt_sat_boundaries() {
        assert_eq!(ccqt_scale(CcqtType::Sat, "400"), Some(400.0));
        assert_eq!(ccqt_scale(CcqtType::Sat, "399"), None);
    }

    #[test]
    fn ccqt_alevel_scale() {
        assert_eq!(ccqt_scale(CcqtType::ALevel, "A*"), Some(1.0));
        assert_eq!(ccqt_scale(CcqtType::ALevel, "U"), Some(0.0));
        assert_eq!(ccqt_scale(CcqtType::ALevel, "X"), None);
    }

    #[test]
    fn vsat_whitelist_excludes_b00() {
        assert!(!VSAT_WHITELIST.contains(&"B00"));
    }
}
