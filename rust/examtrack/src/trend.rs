use crate::calc::{self, SubjectStanding};
use crate::config::AnalyticsConfig;
use crate::model::{ExamEntry, Model, Student, Subject, SubjectScores};
use crate::rank::{self, SubjectRank};
use crate::reports;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub exam: String,
    pub rank: usize,
    pub rank_change: i64,
    pub score: f64,
    pub score_change: f64,
}

fn position_in_exam(model: &Model, student: &Student, exam: &str) -> usize {
    rank::exam_rank_for_student(model, &student.roll, exam).unwrap_or(0)
}

/// Exam-over-exam deltas for the student's qualifying exams in exam order.
/// The first exam has nothing to compare against and yields no entry.
pub fn progress_for_student(model: &Model, roll: &str) -> Option<Vec<ProgressEntry>> {
    let student = model.student(roll)?;
    let attempts = model.ordered_attempts(student);
    let ranks: Vec<usize> = attempts
        .iter()
        .map(|ex| position_in_exam(model, student, &ex.exam))
        .collect();

    let progress = attempts
        .windows(2)
        .zip(ranks.windows(2))
        .map(|(pair, rank_pair)| ProgressEntry {
            exam: pair[1].exam.clone(),
            rank: rank_pair[1],
            rank_change: rank_pair[0] as i64 - rank_pair[1] as i64,
            score: pair[1].total,
            score_change: pair[1].total - pair[0].total,
        })
        .collect();
    Some(progress)
}

/// Latest exam percent minus the lifetime cumulative percent. This compares
/// the most recent exam against the whole history, not against the previous
/// exam. Zero when nothing was attempted.
pub fn improvement_rate(model: &Model, student: &Student) -> f64 {
    match latest_attempt(model, student) {
        Some(last) => last.score_percent() - student.stats.cum_percent,
        None => 0.0,
    }
}

fn latest_attempt<'a>(model: &Model, student: &'a Student) -> Option<&'a ExamEntry> {
    model.ordered_attempts(student).last().copied()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub roll: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline: Option<f64>,
    pub reason: String,
}

impl CategoryEntry {
    fn new(student: &Student, reason: String) -> Self {
        Self {
            roll: student.roll.clone(),
            name: student.name.clone(),
            score: None,
            improvement: None,
            decline: None,
            reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Categorization {
    pub high_performers: Vec<CategoryEntry>,
    pub at_risk_students: Vec<CategoryEntry>,
    pub improving_students: Vec<CategoryEntry>,
    pub declining_students: Vec<CategoryEntry>,
}

/// Each category is tested independently; a student may land in several.
pub fn categorize(model: &Model, config: &AnalyticsConfig) -> Categorization {
    let mut out = Categorization::default();

    for student in model.students.values() {
        let overall = student.stats.cum_percent;
        let rate = improvement_rate(model, student);

        if overall >= config.high_performer_percent {
            out.high_performers.push(CategoryEntry {
                score: Some(overall),
                ..CategoryEntry::new(
                    student,
                    format!("Excellent overall performance: {:.1}%", overall),
                )
            });
        }

        let at_risk = overall < config.at_risk_percent || rate < config.at_risk_decline;
        if at_risk {
            let reason = if overall < config.at_risk_percent {
                format!("Critical performance level: {:.2}%", overall)
            } else {
                format!("Significant performance decline: {:.1}% drop", rate.abs())
            };
            out.at_risk_students.push(CategoryEntry {
                score: Some(overall),
                ..CategoryEntry::new(student, reason)
            });
        }

        if rate > config.improving_rate {
            out.improving_students.push(CategoryEntry {
                improvement: Some(calc::round_off_2_decimal(rate)),
                ..CategoryEntry::new(
                    student,
                    format!("Strong upward trend: {:.2}% improvement", rate),
                )
            });
        }

        // A steep decline is already reported as at-risk.
        if rate < config.declining_rate && overall >= config.at_risk_percent && !at_risk {
            out.declining_students.push(CategoryEntry {
                decline: Some(calc::round_off_2_decimal(rate.abs())),
                ..CategoryEntry::new(
                    student,
                    format!("Performance declining: {:.2}% drop", rate.abs()),
                )
            });
        }
    }

    debug!(
        high = out.high_performers.len(),
        at_risk = out.at_risk_students.len(),
        improving = out.improving_students.len(),
        declining = out.declining_students.len(),
        "categorized students"
    );
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStudent {
    pub roll: String,
    pub name: String,
    pub cum_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub student: AlertStudent,
    pub severity: Severity,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exams: Vec<String>,
}

impl Alert {
    fn new(student: &Student, severity: Severity, message: String, action: &str) -> Self {
        Self {
            student: AlertStudent {
                roll: student.roll.clone(),
                name: student.name.clone(),
                cum_percent: student.stats.cum_percent,
            },
            severity,
            message,
            action: action.to_string(),
            exams: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alerts {
    pub low_performance: Vec<Alert>,
    pub sudden_drop: Vec<Alert>,
    pub improvement_recognition: Vec<Alert>,
    pub missing_exam: Vec<Alert>,
}

/// Exams in exam order the student has a row for (any max total, including
/// a zero placeholder) but never attempted.
pub fn missed_exams(model: &Model, student: &Student) -> Vec<String> {
    model
        .exam_order
        .iter()
        .filter(|exam| {
            let enrolled = student
                .exams
                .iter()
                .any(|e| &e.exam == *exam && e.max_total >= 0.0);
            enrolled && student.attempt(exam).is_none()
        })
        .cloned()
        .collect()
}

pub fn generate_alerts(model: &Model, config: &AnalyticsConfig) -> Alerts {
    let mut out = Alerts::default();

    for student in model.students.values() {
        let overall = student.stats.cum_percent;
        let who = format!("{} ({})", student.name, student.roll);

        if overall > 0.0 && overall < config.low_performance_percent {
            let high = overall < config.low_performance_high_severity_percent;
            out.low_performance.push(Alert::new(
                student,
                if high { Severity::High } else { Severity::Medium },
                format!("{} has critically low performance at {:.2}%", who, overall),
                if high {
                    "Immediate intervention required - schedule parent meeting and create recovery plan"
                } else {
                    "Monitor closely and provide additional support resources"
                },
            ));
        }

        if let Some(last) = latest_attempt(model, student) {
            let recent_decline = overall - last.score_percent();
            if recent_decline > config.sudden_drop_percent {
                out.sudden_drop.push(Alert::new(
                    student,
                    Severity::High,
                    format!(
                        "{} has experienced a significant performance drop of {:.2}%",
                        who, recent_decline
                    ),
                    "Investigate underlying causes, check attendance, and provide counseling support",
                ));
            }

            let rate = last.score_percent() - overall;
            if rate > config.improvement_recognition_rate {
                out.improvement_recognition.push(Alert::new(
                    student,
                    Severity::Positive,
                    format!("{} has shown excellent improvement of {:.1}%", who, rate),
                    "Acknowledge achievement and maintain current support strategies",
                ));
            }
        }

        let missed = missed_exams(model, student);
        if !missed.is_empty() {
            let mut alert = Alert::new(
                student,
                Severity::Medium,
                format!(
                    "{} has missed {} enrolled exams: {}",
                    who,
                    missed.len(),
                    missed.join(", ")
                ),
                "Contact student/parents immediately and arrange makeup exams if possible",
            );
            alert.exams = missed;
            out.missing_exam.push(alert);
        }
    }

    debug!(
        low = out.low_performance.len(),
        drop = out.sudden_drop.len(),
        improvement = out.improvement_recognition.len(),
        missing = out.missing_exam.len(),
        "generated alerts"
    );
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPoint {
    pub exam: String,
    pub total: f64,
    pub max_total: f64,
    pub percent: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub points: Vec<ExamPoint>,
    pub trend: f64,
    pub direction: TrendDirection,
    pub consistency: f64,
    pub subject_balance: f64,
    pub latest: Option<ExamPoint>,
}

/// Direction over the last three exams plus spread figures.
pub fn trend_summary(model: &Model, student: &Student) -> TrendSummary {
    let points: Vec<ExamPoint> = model
        .ordered_attempts(student)
        .into_iter()
        .map(|ex| ExamPoint {
            exam: ex.exam.clone(),
            total: ex.total,
            max_total: ex.max_total,
            percent: calc::round_off_2_decimal(ex.score_percent()),
            rank: position_in_exam(model, student, &ex.exam),
        })
        .collect();

    let tail = &points[points.len().saturating_sub(3)..];
    let trend = match (tail.first(), tail.last()) {
        (Some(first), Some(last)) if tail.len() >= 2 => {
            calc::round_off_2_decimal(last.percent - first.percent)
        }
        _ => 0.0,
    };
    let direction = if trend > 0.0 {
        TrendDirection::Upward
    } else if trend < 0.0 {
        TrendDirection::Downward
    } else {
        TrendDirection::Stable
    };

    let percents: Vec<f64> = points.iter().map(|p| p.percent).collect();
    let subject_avgs: Vec<f64> = Subject::ALL
        .iter()
        .map(|s| student.stats.subject_averages.get(*s))
        .collect();

    TrendSummary {
        latest: points.last().cloned(),
        points,
        trend,
        direction,
        consistency: calc::round_off_2_decimal(calc::std_dev(&percents)),
        subject_balance: calc::round_off_2_decimal(calc::std_dev(&subject_avgs)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMark {
    pub exam: String,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectExtremes {
    pub best: SubjectMark,
    pub worst: SubjectMark,
}

/// Best and worst exam per subject; `None` where the subject never applied.
/// The earliest exam wins ties.
pub fn subject_extremes(model: &Model, student: &Student) -> BTreeMap<Subject, Option<SubjectExtremes>> {
    let attempts = model.ordered_attempts(student);
    Subject::ALL
        .into_iter()
        .map(|subject| {
            let mut best: Option<SubjectMark> = None;
            let mut worst: Option<SubjectMark> = None;
            for ex in attempts.iter().filter(|e| e.subject_applies(subject)) {
                let pct = calc::round_off_2_decimal(calc::percent_of(
                    ex.scores.get(subject),
                    ex.max_scores.get(subject),
                ));
                if best.as_ref().map(|b| pct > b.percent).unwrap_or(true) {
                    best = Some(SubjectMark {
                        exam: ex.exam.clone(),
                        percent: pct,
                    });
                }
                if worst.as_ref().map(|w| pct < w.percent).unwrap_or(true) {
                    worst = Some(SubjectMark {
                        exam: ex.exam.clone(),
                        percent: pct,
                    });
                }
            }
            let extremes = match (best, worst) {
                (Some(best), Some(worst)) => Some(SubjectExtremes { best, worst }),
                _ => None,
            };
            (subject, extremes)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub roll: String,
    pub name: String,
    pub cum_total: f64,
    pub cum_max: f64,
    pub cum_percent: f64,
    pub performance_level: &'static str,
    pub exams_attempted: usize,
    pub subject_averages: SubjectScores,
    pub strong_subjects: SubjectStanding,
    pub weak_subjects: SubjectStanding,
    pub strong_label: String,
    pub weak_label: String,
    pub improvement_rate: f64,
    pub subject_ranks: BTreeMap<Subject, SubjectRank>,
    pub progress: Vec<ProgressEntry>,
    pub trend: TrendSummary,
    pub subject_extremes: BTreeMap<Subject, Option<SubjectExtremes>>,
}

/// Everything the student detail view shows, `None` for an unknown roll.
pub fn student_profile(model: &Model, roll: &str) -> Option<StudentProfile> {
    let student = model.student(roll)?;
    let stats = &student.stats;
    Some(StudentProfile {
        roll: student.roll.clone(),
        name: student.name.clone(),
        cum_total: stats.cum_total,
        cum_max: stats.cum_max,
        cum_percent: stats.cum_percent,
        performance_level: reports::performance_level(stats.cum_percent),
        exams_attempted: stats.exams_attempted,
        subject_averages: stats.subject_averages,
        strong_subjects: stats.strong_subjects.clone(),
        weak_subjects: stats.weak_subjects.clone(),
        strong_label: stats.strong_subjects.label(&stats.subject_averages),
        weak_label: stats.weak_subjects.label(&stats.subject_averages),
        improvement_rate: calc::round_off_2_decimal(improvement_rate(model, student)),
        subject_ranks: rank::subject_ranks_for_student(model, &student.roll)?,
        progress: progress_for_student(model, &student.roll)?,
        trend: trend_summary(model, student),
        subject_extremes: subject_extremes(model, student),
    })
}
