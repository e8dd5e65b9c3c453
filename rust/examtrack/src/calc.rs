use crate::model::{ExamEntry, Subject, SubjectScores};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Dashboard display rounding: `toFixed(1)`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Dashboard display rounding: `toFixed(2)`.
pub fn round_off_2_decimal(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `100 * obtained / max`, or 0 when there is no maximum.
pub fn percent_of(obtained: f64, max: f64) -> f64 {
    if max > 0.0 {
        100.0 * obtained / max
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64);
    var.sqrt()
}

/// Descending by score; NaN never reaches here but must not panic.
pub fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl EngineError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Strongest or weakest subjects of a student. Ties keep every subject.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubjectStanding {
    #[default]
    NotApplicable,
    Subjects(Vec<Subject>),
}

impl SubjectStanding {
    pub fn subjects(&self) -> &[Subject] {
        match self {
            SubjectStanding::NotApplicable => &[],
            SubjectStanding::Subjects(v) => v,
        }
    }

    /// "CHEMISTRY (81.25%), BIOLOGY (81.25%)" or "N/A".
    pub fn label(&self, averages: &SubjectScores) -> String {
        match self {
            SubjectStanding::NotApplicable => "N/A".to_string(),
            SubjectStanding::Subjects(v) => v
                .iter()
                .map(|s| format!("{} ({:.2}%)", s.display_name(), averages.get(*s)))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Serialize for SubjectStanding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SubjectStanding::NotApplicable => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element("N/A")?;
                seq.end()
            }
            SubjectStanding::Subjects(v) => v.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeStats {
    pub cum_total: f64,
    pub cum_max: f64,
    pub cum_percent: f64,
    pub subject_totals: SubjectScores,
    pub subject_max_totals: SubjectScores,
    pub subject_averages: SubjectScores,
    pub exams_attempted: usize,
    pub strong_subjects: SubjectStanding,
    pub weak_subjects: SubjectStanding,
}

/// Derives a student's cumulative fields from scratch. Only exams with a
/// positive max total count; a subject counts only where its own max is positive.
pub fn compute_cumulatives(exams: &[ExamEntry]) -> CumulativeStats {
    let mut cum_total = 0.0_f64;
    let mut cum_max = 0.0_f64;
    let mut exams_attempted = 0_usize;
    let mut subject_totals = SubjectScores::default();
    let mut subject_max_totals = SubjectScores::default();

    for ex in exams.iter().filter(|e| e.qualifies()) {
        cum_total += ex.total;
        cum_max += ex.max_total;
        exams_attempted += 1;
        for s in Subject::ALL {
            if ex.subject_applies(s) {
                *subject_totals.get_mut(s) += ex.scores.get(s);
                *subject_max_totals.get_mut(s) += ex.max_scores.get(s);
            }
        }
    }

    let mut subject_averages = SubjectScores::default();
    for s in Subject::ALL {
        *subject_averages.get_mut(s) = round_off_2_decimal(percent_of(
            subject_totals.get(s),
            subject_max_totals.get(s),
        ));
    }

    let (strong_subjects, weak_subjects) = if exams_attempted > 0 {
        extreme_subjects(&subject_averages)
    } else {
        (SubjectStanding::NotApplicable, SubjectStanding::NotApplicable)
    };

    CumulativeStats {
        cum_total,
        cum_max,
        cum_percent: round_off_2_decimal(percent_of(cum_total, cum_max)),
        subject_totals,
        subject_max_totals,
        subject_averages,
        exams_attempted,
        strong_subjects,
        weak_subjects,
    }
}

fn extreme_subjects(averages: &SubjectScores) -> (SubjectStanding, SubjectStanding) {
    let values: Vec<f64> = Subject::ALL.iter().map(|s| averages.get(*s)).collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let pick = |target: f64| -> Vec<Subject> {
        Subject::ALL
            .into_iter()
            .filter(|s| averages.get(*s) == target)
            .collect()
    };
    (
        SubjectStanding::Subjects(pick(max)),
        SubjectStanding::Subjects(pick(min)),
    )
}
