//! The bit-exact request/response wire contract exchanged with the
//! inference server (§6). Field names and enum values here must not be
//! renamed — they are consumed verbatim by the remote service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// L1 (priority-based) request input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInputL1 {
    pub nhom_nganh: String,
    pub tinh_tp: String,
    pub hoc_phi: f64,
    pub cong_lap: Option<u8>,
    pub hsg_1: String,
    pub hsg_2: String,
    pub hsg_3: String,
    pub haimuoi_huyen_ngheo_tnb: u8,
    pub dan_toc_thieu_so: u8,
    pub ahld: u8,
}

/// L2 (exam-based) request input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInputL2 {
    pub nhom_nganh: String,
    pub tinh_tp: String,
    pub hoc_phi: f64,
    pub cong_lap: Option<u8>,
    pub to_hop_mon: String,
    pub diem_chuan: f64,
    pub diem_ccta: Option<f64>,
    pub ten_ccta: Option<String>,
}

/// L3 (transcript-based) request input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInputL3 {
    pub nhom_nganh: String,
    pub tinh_tp: String,
    pub hoc_phi: f64,
    pub cong_lap: Option<u8>,
    pub thpt: Thpt,
    pub hoc_ba: Vec<HocBaRow>,
    pub award_qg: Option<AwardQg>,
    pub award_english: Option<NangKhieuScore>,
    pub int_cer: Option<NangKhieuScore>,
    pub dgnl: Option<Dgnl>,
}

/// THPT (national graduation exam) score block: two named required
/// subjects plus two electives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thpt {
    pub ngu_van: f64,
    pub toan: f64,
    pub elective_1: L3NationalSubject,
    pub elective_2: L3NationalSubject,
}

/// A national-exam subject tagged with its score, used for THPT electives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct L3NationalSubject {
    pub subject: String,
    pub score: f64,
}

/// One academic-transcript row (`hoc_ba`): per-grade averaged subject
/// scores plus performance/conduct labels for that grade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HocBaRow {
    pub grade: u8,
    pub hk10: Option<f64>,
    pub hk11: Option<f64>,
    pub hk12: Option<f64>,
    pub hl10: Option<String>,
    pub hl11: Option<String>,
    pub hl12: Option<String>,
}

/// Academic excellence award (`award_qg`): rank-derived numeric level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardQg {
    pub subject: String,
    pub level: u8,
}

/// A scored certificate/aptitude component, shared shape for
/// `award_english` / `int_cer` (InterCerEnum-tagged).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NangKhieuScore {
    pub cer_type: String,
    pub score: f64,
}

/// DGNL (VNUHCM aptitude test) three-component score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dgnl {
    pub component_1: f64,
    pub component_2: f64,
    pub component_3: f64,
}

/// L1 inference result: one entry per priority type, each carrying a map
/// of admission codes to predicted scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct L1PredictResult {
    pub priority_type: String,
    #[serde(flatten)]
    pub scores: HashMap<String, f64>,
}

/// L2 inference result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct L2PredictResult {
    pub admission_code: String,
    pub score: f64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct L3MajorEntry {
    pub major_code: String,
    pub major_group: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// L3 inference result: university code -> list of candidate majors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct L3PredictResult {
    pub result: HashMap<String, Vec<L3MajorEntry>>,
}

/// Upstream's 422 validation-error body shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationErrorBody {
    pub detail: Vec<ValidationErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationErrorDetail {
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ValidationErrorDetail {
    /// Joins `loc` segments with `.` for the "loc.path - msg" diagnostic.
    pub fn joined(&self) -> String {
        let path = self
            .loc
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        format!("{} - {}", path, self.msg)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<T: Serialize> {
    pub items: Vec<T>,
}
