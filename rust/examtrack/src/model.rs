use crate::calc::{self, CumulativeStats};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Chem,
    Phy,
    Bio,
    Math,
}

impl Subject {
    pub const ALL: [Subject; 4] = [Subject::Chem, Subject::Phy, Subject::Bio, Subject::Math];

    pub fn key(self) -> &'static str {
        match self {
            Subject::Chem => "chem",
            Subject::Phy => "phy",
            Subject::Bio => "bio",
            Subject::Math => "math",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Chem => "CHEMISTRY",
            Subject::Phy => "PHYSICS",
            Subject::Bio => "BIOLOGY",
            Subject::Math => "MATHEMATICS",
        }
    }

    /// Accepts the wire key or the display name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Subject> {
        let t = raw.trim();
        Subject::ALL
            .into_iter()
            .find(|s| t.eq_ignore_ascii_case(s.key()) || t.eq_ignore_ascii_case(s.display_name()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubjectScores {
    pub chem: f64,
    pub phy: f64,
    pub bio: f64,
    pub math: f64,
}

impl SubjectScores {
    pub fn get(&self, subject: Subject) -> f64 {
        match subject {
            Subject::Chem => self.chem,
            Subject::Phy => self.phy,
            Subject::Bio => self.bio,
            Subject::Math => self.math,
        }
    }

    pub fn get_mut(&mut self, subject: Subject) -> &mut f64 {
        match subject {
            Subject::Chem => &mut self.chem,
            Subject::Phy => &mut self.phy,
            Subject::Bio => &mut self.bio,
            Subject::Math => &mut self.math,
        }
    }
}

/// One flat row as delivered by the ingestion collaborator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub roll: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub exam: String,
    #[serde(deserialize_with = "lenient_number")]
    pub chem: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub phy: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub bio: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub math: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub total: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub percent: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub max_total: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub max_chem: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub max_phy: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub max_bio: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub max_math: f64,
}

fn coerce_number(v: &serde_json::Value) -> f64 {
    let n = match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&v))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => number_key(&n),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// `17` and `17.0` name the same roll.
fn number_key(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamEntry {
    pub exam: String,
    pub scores: SubjectScores,
    pub max_scores: SubjectScores,
    pub total: f64,
    pub percent: f64,
    pub max_total: f64,
}

impl ExamEntry {
    fn from_record(row: &ExamRecord, exam: String) -> Self {
        Self {
            exam,
            scores: SubjectScores {
                chem: row.chem,
                phy: row.phy,
                bio: row.bio,
                math: row.math,
            },
            max_scores: SubjectScores {
                chem: row.max_chem,
                phy: row.max_phy,
                bio: row.max_bio,
                math: row.max_math,
            },
            total: row.total,
            percent: row.percent,
            max_total: row.max_total,
        }
    }

    /// The exam applied to this student.
    pub fn qualifies(&self) -> bool {
        self.max_total > 0.0
    }

    pub fn subject_applies(&self, subject: Subject) -> bool {
        self.qualifies() && self.max_scores.get(subject) > 0.0
    }

    /// Obtained over maximum for this exam alone, unrounded.
    pub fn score_percent(&self) -> f64 {
        calc::percent_of(self.total, self.max_total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub roll: String,
    pub name: String,
    pub exams: Vec<ExamEntry>,
    #[serde(flatten)]
    pub stats: CumulativeStats,
}

impl Student {
    pub fn qualifying_exams(&self) -> impl Iterator<Item = &ExamEntry> {
        self.exams.iter().filter(|e| e.qualifies())
    }

    /// First qualifying record for `exam`, if any.
    pub fn attempt(&self, exam: &str) -> Option<&ExamEntry> {
        self.exams.iter().find(|e| e.exam == exam && e.qualifies())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub students: BTreeMap<String, Student>,
    pub exam_order: Vec<String>,
}

impl Model {
    pub fn student(&self, roll: &str) -> Option<&Student> {
        self.students.get(roll.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn exam_position(&self, exam: &str) -> Option<usize> {
        self.exam_order.iter().position(|e| e == exam)
    }

    pub fn record_count(&self) -> usize {
        self.students.values().map(|s| s.exams.len()).sum()
    }

    /// Qualifying exams of a student in canonical exam order.
    pub fn ordered_attempts<'a>(&self, student: &'a Student) -> Vec<&'a ExamEntry> {
        let mut attempts: Vec<&ExamEntry> = student.qualifying_exams().collect();
        attempts.sort_by_key(|e| self.exam_position(&e.exam).unwrap_or(usize::MAX));
        attempts
    }
}

/// Groups flat rows by roll, fixes the exam order and derives every
/// student's cumulative fields. Rows without roll or name are skipped.
pub fn build_model(rows: &[ExamRecord]) -> Model {
    let mut students: BTreeMap<String, Student> = BTreeMap::new();
    let mut exam_order: Vec<String> = Vec::new();
    let mut seen_exams: HashSet<String> = HashSet::new();
    let mut skipped = 0_usize;

    for row in rows {
        let roll = row.roll.trim();
        let name = row.name.trim();
        if roll.is_empty() || name.is_empty() {
            skipped += 1;
            continue;
        }
        let exam = row.exam.trim().to_string();

        if row.max_total > 0.0 && seen_exams.insert(exam.clone()) {
            exam_order.push(exam.clone());
        }

        let student = students.entry(roll.to_string()).or_insert_with(|| Student {
            roll: roll.to_string(),
            name: String::new(),
            exams: Vec::new(),
            stats: CumulativeStats::default(),
        });
        student.name = name.to_string();
        student.exams.push(ExamEntry::from_record(row, exam));
    }

    if skipped > 0 {
        warn!(skipped, "skipped rows without roll or name");
    }

    for student in students.values_mut() {
        student.stats = calc::compute_cumulatives(&student.exams);
    }

    let model = Model {
        students,
        exam_order,
    };
    info!(
        students = model.students.len(),
        exams = model.exam_order.len(),
        records = model.record_count(),
        "model built"
    );
    model
}

/// Extracts rows from either a bare array or the ingestion envelope
/// `{ success, data, count }`. An unsuccessful or empty payload yields no rows.
pub fn rows_from_payload(payload: &serde_json::Value) -> anyhow::Result<Vec<ExamRecord>> {
    let rows = match payload {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(_) => payload,
        serde_json::Value::Object(obj) => {
            if obj.get("success").and_then(|v| v.as_bool()) == Some(false) {
                warn!(
                    message = obj.get("message").and_then(|v| v.as_str()).unwrap_or(""),
                    "ingestion reported failure; loading empty data"
                );
                return Ok(Vec::new());
            }
            match obj.get("data") {
                None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
                Some(data) => data,
            }
        }
        other => return Err(anyhow!("unsupported payload type: {}", json_kind(other))),
    };
    let serde_json::Value::Array(items) = rows else {
        return Err(anyhow!("payload data must be an array"));
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let row = ExamRecord::deserialize(item).with_context(|| format!("row {} is not an object", i))?;
        out.push(row);
    }
    Ok(out)
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
