use crate::calc::{self, EngineError};
use crate::model::{Model, Student, Subject};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

/// 1-based rank, or the "-" placeholder for a zero score in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankCell {
    Ranked(usize),
    Unranked,
}

impl RankCell {
    pub fn position(self) -> Option<usize> {
        match self {
            RankCell::Ranked(n) => Some(n),
            RankCell::Unranked => None,
        }
    }
}

impl Serialize for RankCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RankCell::Ranked(n) => serializer.serialize_u64(*n as u64),
            RankCell::Unranked => serializer.serialize_str("-"),
        }
    }
}

/// Exam category selection by label prefix ("RT", "WE", "MT", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExamFilter {
    #[default]
    All,
    Prefix(String),
}

impl ExamFilter {
    pub fn parse(raw: Option<&serde_json::Value>) -> Result<ExamFilter, EngineError> {
        let Some(raw) = raw else {
            return Ok(ExamFilter::All);
        };
        if raw.is_null() {
            return Ok(ExamFilter::All);
        }
        let Some(s) = raw.as_str() else {
            return Err(EngineError::new(
                "bad_params",
                "filter must be a string prefix or 'all'",
            ));
        };
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") {
            Ok(ExamFilter::All)
        } else {
            Ok(ExamFilter::Prefix(t.to_string()))
        }
    }

    pub fn matches(&self, exam: &str) -> bool {
        match self {
            ExamFilter::All => true,
            ExamFilter::Prefix(p) => exam.starts_with(p.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ExamFilter::All => "all",
            ExamFilter::Prefix(p) => p,
        }
    }

    /// Matching exams in canonical order.
    pub fn select(&self, exam_order: &[String]) -> Vec<String> {
        exam_order
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRow {
    pub rank: RankCell,
    pub roll: String,
    pub name: String,
    pub exams_attempted: usize,
    pub total: f64,
    pub max_total: f64,
    pub percent: f64,
}

impl RankRow {
    fn new(student: &Student, exams_attempted: usize, total: f64, max_total: f64) -> Self {
        Self {
            rank: RankCell::Unranked,
            roll: student.roll.clone(),
            name: student.name.clone(),
            exams_attempted,
            total,
            max_total,
            percent: calc::round_off_2_decimal(calc::percent_of(total, max_total)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCell {
    pub score: f64,
    pub max: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRankRow {
    pub rank: RankCell,
    pub roll: String,
    pub name: String,
    pub subjects: BTreeMap<Subject, Option<SubjectCell>>,
    pub total: f64,
    pub max_total: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRank {
    pub rank: RankCell,
    pub total: f64,
}

trait Rankable {
    fn score(&self) -> f64;
    fn roll(&self) -> &str;
    fn set_rank(&mut self, rank: RankCell);
}

impl Rankable for RankRow {
    fn score(&self) -> f64 {
        self.total
    }
    fn roll(&self) -> &str {
        &self.roll
    }
    fn set_rank(&mut self, rank: RankCell) {
        self.rank = rank;
    }
}

impl Rankable for ExamRankRow {
    fn score(&self) -> f64 {
        self.total
    }
    fn roll(&self) -> &str {
        &self.roll
    }
    fn set_rank(&mut self, rank: RankCell) {
        self.rank = rank;
    }
}

/// Sorts by (score desc, roll asc) and numbers the rows. Rows without a
/// positive score keep their position but get the placeholder.
fn assign_ranks<T: Rankable>(rows: &mut [T]) {
    rows.sort_by(|a, b| calc::cmp_desc(a.score(), b.score()).then_with(|| a.roll().cmp(b.roll())));
    for (i, row) in rows.iter_mut().enumerate() {
        let rank = if row.score() > 0.0 {
            RankCell::Ranked(i + 1)
        } else {
            RankCell::Unranked
        };
        row.set_rank(rank);
    }
}

/// Cumulative total over every qualifying exam.
pub fn overall_ranking(model: &Model) -> Vec<RankRow> {
    filtered_ranking(model, &ExamFilter::All)
}

/// Cumulative ranking restricted to exams whose label matches `filter`.
pub fn filtered_ranking(model: &Model, filter: &ExamFilter) -> Vec<RankRow> {
    let mut rows: Vec<RankRow> = model
        .students
        .values()
        .map(|s| {
            let mut total = 0.0;
            let mut max_total = 0.0;
            let mut attempted = 0;
            for ex in s.qualifying_exams().filter(|e| filter.matches(&e.exam)) {
                total += ex.total;
                max_total += ex.max_total;
                attempted += 1;
            }
            RankRow::new(s, attempted, total, max_total)
        })
        .collect();
    assign_ranks(&mut rows);
    debug!(filter = filter.label(), rows = rows.len(), "filtered ranking");
    rows
}

/// The last `window_size` exams of the filtered exam order.
pub fn window_exams(exam_order: &[String], window_size: usize, filter: &ExamFilter) -> Vec<String> {
    let selected = filter.select(exam_order);
    let start = selected.len().saturating_sub(window_size);
    selected[start..].to_vec()
}

/// Ranking over the most recent exams. A student contributes per exam only
/// through a qualifying record for that exact label.
pub fn windowed_ranking(model: &Model, window_size: usize, filter: &ExamFilter) -> Vec<RankRow> {
    let exams = window_exams(&model.exam_order, window_size, filter);
    let mut rows: Vec<RankRow> = model
        .students
        .values()
        .map(|s| {
            let mut total = 0.0;
            let mut max_total = 0.0;
            let mut attempted = 0;
            for ex in exams.iter().filter_map(|name| s.attempt(name)) {
                total += ex.total;
                max_total += ex.max_total;
                attempted += 1;
            }
            RankRow::new(s, attempted, total, max_total)
        })
        .collect();
    assign_ranks(&mut rows);
    debug!(?exams, rows = rows.len(), "windowed ranking");
    rows
}

/// Students who never had the subject are left out entirely.
pub fn subject_ranking(model: &Model, subject: Subject) -> Vec<RankRow> {
    let mut rows: Vec<RankRow> = model
        .students
        .values()
        .filter(|s| s.stats.subject_max_totals.get(subject) > 0.0)
        .map(|s| {
            let attempted = s.exams.iter().filter(|e| e.subject_applies(subject)).count();
            RankRow::new(
                s,
                attempted,
                s.stats.subject_totals.get(subject),
                s.stats.subject_max_totals.get(subject),
            )
        })
        .collect();
    assign_ranks(&mut rows);
    debug!(subject = subject.key(), rows = rows.len(), "subject ranking");
    rows
}

/// Students with a qualifying record for `exam`, ranked by that exam's total.
pub fn exam_ranking(model: &Model, exam: &str) -> Vec<ExamRankRow> {
    let exam = exam.trim();
    let mut rows: Vec<ExamRankRow> = model
        .students
        .values()
        .filter_map(|s| s.attempt(exam).map(|ex| (s, ex)))
        .map(|(s, ex)| {
            let subjects = Subject::ALL
                .into_iter()
                .map(|sub| {
                    let max = ex.max_scores.get(sub);
                    let cell = (max > 0.0).then(|| SubjectCell {
                        score: ex.scores.get(sub),
                        max,
                        percent: calc::round_off_2_decimal(calc::percent_of(ex.scores.get(sub), max)),
                    });
                    (sub, cell)
                })
                .collect();
            ExamRankRow {
                rank: RankCell::Unranked,
                roll: s.roll.clone(),
                name: s.name.clone(),
                subjects,
                total: ex.total,
                max_total: ex.max_total,
                percent: calc::round_off_2_decimal(ex.score_percent()),
            }
        })
        .collect();
    assign_ranks(&mut rows);
    debug!(exam, rows = rows.len(), "exam ranking");
    rows
}

/// Position of the student within the exam's ranking, `None` when the roll
/// is unknown or the student has no qualifying record for the exam.
pub fn exam_rank_for_student(model: &Model, roll: &str, exam: &str) -> Option<usize> {
    let roll = roll.trim();
    model.student(roll)?;
    exam_ranking(model, exam)
        .iter()
        .position(|r| r.roll == roll)
        .map(|i| i + 1)
}

/// Rank within every subject ranking, `None` for an unknown roll.
pub fn subject_ranks_for_student(model: &Model, roll: &str) -> Option<BTreeMap<Subject, SubjectRank>> {
    let student = model.student(roll)?;
    let mut out = BTreeMap::new();
    for subject in Subject::ALL {
        let rank = if student.stats.subject_max_totals.get(subject) > 0.0 {
            subject_ranking(model, subject)
                .iter()
                .find(|r| r.roll == student.roll)
                .map(|r| r.rank)
                .unwrap_or(RankCell::Unranked)
        } else {
            RankCell::Unranked
        };
        out.insert(
            subject,
            SubjectRank {
                rank,
                total: student.stats.subject_totals.get(subject),
            },
        );
    }
    Some(out)
}

/// Students whose name or roll contains `query`, case-insensitively, ranked
/// among the matches by cumulative total. A blank query matches nobody.
pub fn search_students(model: &Model, query: &str) -> Vec<RankRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut rows: Vec<RankRow> = model
        .students
        .values()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle) || s.roll.to_lowercase().contains(&needle)
        })
        .map(|s| RankRow::new(s, s.stats.exams_attempted, s.stats.cum_total, s.stats.cum_max))
        .collect();
    assign_ranks(&mut rows);
    debug!(query = %needle, rows = rows.len(), "student search");
    rows
}
