use crate::calc::{self, SubjectStanding};
use crate::config::AnalyticsConfig;
use crate::difficulty::{self, ExamDifficulty};
use crate::model::{Model, Student, Subject};
use crate::rank::ExamFilter;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub fn performance_level(percent: f64) -> &'static str {
    match percent {
        p if p >= 80.0 => "Excellent",
        p if p >= 65.0 => "Good",
        p if p >= 50.0 => "Average",
        p if p >= 35.0 => "Below Average",
        _ => "Needs Improvement",
    }
}

/// Human label for a category filter, as printed in report headers.
pub fn filter_label(filter: &ExamFilter) -> String {
    match filter {
        ExamFilter::All => "All Exams".to_string(),
        ExamFilter::Prefix(p) => match p.as_str() {
            "RT" => "Revision Tests (RT)".to_string(),
            "WE" => "Weekly Exams (WE)".to_string(),
            "MT" => "Mega Tests (MT)".to_string(),
            other => format!("{} Exams", other),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedScore {
    pub roll: String,
    pub name: String,
    pub total: f64,
    pub max_total: f64,
    pub percentage: f64,
    pub exams_attempted: usize,
}

fn scoped_score(student: &Student, exams: &[String]) -> ScopedScore {
    let mut total = 0.0;
    let mut max_total = 0.0;
    let mut attempted = 0;
    for ex in student
        .qualifying_exams()
        .filter(|e| exams.iter().any(|x| x == &e.exam))
    {
        total += ex.total;
        max_total += ex.max_total;
        attempted += 1;
    }
    ScopedScore {
        roll: student.roll.clone(),
        name: student.name.clone(),
        total,
        max_total,
        percentage: calc::round_off_2_decimal(calc::percent_of(total, max_total)),
        exams_attempted: attempted,
    }
}

fn active_scores(model: &Model, exams: &[String]) -> Vec<ScopedScore> {
    model
        .students
        .values()
        .map(|s| scoped_score(s, exams))
        .filter(|s| s.max_total > 0.0)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub total_students: usize,
    pub active_students: usize,
    pub avg_percentage: f64,
    pub pass_rate: f64,
    pub fail_rate: f64,
    pub participation_rate: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    pub total_score: f64,
    pub total_max_score: f64,
    pub total_exams: usize,
}

pub fn class_statistics(model: &Model, exams: &[String], config: &AnalyticsConfig) -> ClassStatistics {
    let active = active_scores(model, exams);
    let total_score: f64 = active.iter().map(|s| s.total).sum();
    let total_max_score: f64 = active.iter().map(|s| s.max_total).sum();
    let pass_count = active
        .iter()
        .filter(|s| calc::percent_of(s.total, s.max_total) >= config.pass_percent)
        .count();
    let fail_count = active
        .iter()
        .filter(|s| calc::percent_of(s.total, s.max_total) < config.fail_percent)
        .count();
    let share = |n: usize, of: usize| calc::round_off_2_decimal(calc::percent_of(n as f64, of as f64));

    ClassStatistics {
        total_students: model.students.len(),
        active_students: active.len(),
        avg_percentage: calc::round_off_2_decimal(calc::percent_of(total_score, total_max_score)),
        pass_rate: share(pass_count, active.len()),
        fail_rate: share(fail_count, active.len()),
        participation_rate: share(active.len(), model.students.len()),
        pass_count,
        fail_count,
        total_score,
        total_max_score,
        total_exams: exams.len(),
    }
}

pub fn top_performers(model: &Model, exams: &[String], count: usize) -> Vec<ScopedScore> {
    let mut scores = active_scores(model, exams);
    scores.sort_by(|a, b| calc::cmp_desc(a.total, b.total).then_with(|| a.roll.cmp(&b.roll)));
    scores.truncate(count);
    scores
}

/// Lowest percentages first.
pub fn at_risk_students(
    model: &Model,
    exams: &[String],
    count: usize,
    config: &AnalyticsConfig,
) -> Vec<ScopedScore> {
    let mut scores: Vec<ScopedScore> = active_scores(model, exams)
        .into_iter()
        .filter(|s| s.percentage < config.fail_percent)
        .collect();
    scores.sort_by(|a, b| {
        a.percentage
            .partial_cmp(&b.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.roll.cmp(&b.roll))
    });
    scores.truncate(count);
    scores
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStatistics {
    pub subject: Subject,
    pub name: &'static str,
    pub avg_percentage: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub count: usize,
}

pub fn subject_statistics(model: &Model, exams: &[String]) -> Vec<SubjectStatistics> {
    Subject::ALL
        .into_iter()
        .map(|subject| {
            let mut total_score = 0.0;
            let mut max_score = 0.0;
            let mut count = 0;
            let mut highest: Option<f64> = None;
            let mut lowest: Option<f64> = None;
            for ex in model
                .students
                .values()
                .flat_map(|s| s.exams.iter())
                .filter(|e| e.subject_applies(subject) && exams.iter().any(|x| x == &e.exam))
            {
                let v = ex.scores.get(subject);
                total_score += v;
                max_score += ex.max_scores.get(subject);
                count += 1;
                highest = Some(highest.map_or(v, |h| h.max(v)));
                lowest = Some(lowest.map_or(v, |l| l.min(v)));
            }
            SubjectStatistics {
                subject,
                name: subject.display_name(),
                avg_percentage: calc::round_off_2_decimal(calc::percent_of(total_score, max_score)),
                total_score,
                max_score,
                highest_score: highest.unwrap_or(0.0),
                lowest_score: lowest.unwrap_or(0.0),
                count,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamStatistics {
    pub name: String,
    pub avg_percentage: f64,
    pub student_count: usize,
    pub total_students: usize,
    pub participation_rate: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub avg_score: f64,
    pub difficulty_score: u8,
    pub remark: &'static str,
}

/// Per-exam cohort figures. Difficulty comes from the shared analyzer so
/// this table and the difficulty table always agree.
pub fn exam_statistics(model: &Model, exams: &[String]) -> Vec<ExamStatistics> {
    let by_exam: BTreeMap<String, ExamDifficulty> = difficulty::difficulty_for_exams(model, exams)
        .into_iter()
        .map(|d| (d.name.clone(), d))
        .collect();
    let total_students = model.students.len();

    exams
        .iter()
        .map(|exam| {
            let totals: Vec<(f64, f64)> = model
                .students
                .values()
                .filter_map(|s| s.attempt(exam))
                .map(|e| (e.total, e.max_total))
                .collect();
            let sum: f64 = totals.iter().map(|t| t.0).sum();
            let max: f64 = totals.iter().map(|t| t.1).sum();
            let highest = totals.iter().map(|t| t.0).fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            });
            let lowest = totals.iter().map(|t| t.0).fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            });
            let score = by_exam.get(exam).map(|d| d.difficulty_score).unwrap_or(10);
            ExamStatistics {
                name: exam.clone(),
                avg_percentage: calc::round_off_2_decimal(calc::percent_of(sum, max)),
                student_count: totals.len(),
                total_students,
                participation_rate: calc::round_off_2_decimal(calc::percent_of(
                    totals.len() as f64,
                    total_students as f64,
                )),
                highest_score: highest.unwrap_or(0.0),
                lowest_score: lowest.unwrap_or(0.0),
                avg_score: calc::round_off_2_decimal(if totals.is_empty() {
                    0.0
                } else {
                    sum / totals.len() as f64
                }),
                difficulty_score: score,
                remark: difficulty::difficulty_remark(score),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPerformance {
    pub filter: String,
    pub filter_label: String,
    pub exams: Vec<String>,
    pub stats: ClassStatistics,
    pub performance_level: &'static str,
    pub top_performers: Vec<ScopedScore>,
    pub at_risk_students: Vec<ScopedScore>,
    pub subject_stats: Vec<SubjectStatistics>,
    pub exam_stats: Vec<ExamStatistics>,
    pub difficulty: Vec<ExamDifficulty>,
}

/// The class performance summary for the exams matching `filter`.
pub fn class_performance(model: &Model, filter: &ExamFilter, config: &AnalyticsConfig) -> ClassPerformance {
    let exams = filter.select(&model.exam_order);
    let stats = class_statistics(model, &exams, config);
    ClassPerformance {
        filter: filter.label().to_string(),
        filter_label: filter_label(filter),
        performance_level: performance_level(stats.avg_percentage),
        top_performers: top_performers(model, &exams, config.report_list_size),
        at_risk_students: at_risk_students(model, &exams, config.report_list_size, config),
        subject_stats: subject_statistics(model, &exams),
        exam_stats: exam_statistics(model, &exams),
        difficulty: difficulty::difficulty_for_exams(model, &exams),
        stats,
        exams,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectShare {
    pub total: f64,
    pub max: f64,
    pub avg_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubjectPerformance {
    pub roll: String,
    pub name: String,
    pub subjects: BTreeMap<Subject, SubjectShare>,
    pub overall_total: f64,
    pub overall_max: f64,
    pub overall_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubjectCell {
    pub avg_percent: f64,
    pub highest_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubjectRow {
    pub name: String,
    pub subjects: BTreeMap<Subject, ExamSubjectCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub subjects: Vec<Subject>,
    pub total_students: usize,
    pub total_exams: usize,
    pub class_averages: BTreeMap<Subject, SubjectShare>,
    pub student_performances: Vec<StudentSubjectPerformance>,
    pub top_performers: Vec<StudentSubjectPerformance>,
    pub bottom_performers: Vec<StudentSubjectPerformance>,
    pub exam_stats: Vec<ExamSubjectRow>,
}

fn share(total: f64, max: f64) -> SubjectShare {
    SubjectShare {
        total,
        max,
        avg_percent: calc::round_off_2_decimal(calc::percent_of(total, max)),
    }
}

/// Subject-specific report; `None` covers all four subjects.
pub fn subject_report(model: &Model, subject: Option<Subject>, config: &AnalyticsConfig) -> SubjectReport {
    let subjects: Vec<Subject> = match subject {
        Some(s) => vec![s],
        None => Subject::ALL.to_vec(),
    };

    let class_averages = subjects
        .iter()
        .map(|s| {
            let (t, m) = model.students.values().fold((0.0, 0.0), |(t, m), st| {
                (t + st.stats.subject_totals.get(*s), m + st.stats.subject_max_totals.get(*s))
            });
            (*s, share(t, m))
        })
        .collect();

    let mut student_performances: Vec<StudentSubjectPerformance> = model
        .students
        .values()
        .filter_map(|st| {
            let subs: BTreeMap<Subject, SubjectShare> = subjects
                .iter()
                .filter(|s| st.stats.subject_max_totals.get(**s) > 0.0)
                .map(|s| {
                    (
                        *s,
                        share(st.stats.subject_totals.get(*s), st.stats.subject_max_totals.get(*s)),
                    )
                })
                .collect();
            let overall_total: f64 = subs.values().map(|v| v.total).sum();
            let overall_max: f64 = subs.values().map(|v| v.max).sum();
            (overall_max > 0.0).then(|| StudentSubjectPerformance {
                roll: st.roll.clone(),
                name: st.name.clone(),
                subjects: subs,
                overall_total,
                overall_max,
                overall_percent: calc::round_off_2_decimal(calc::percent_of(overall_total, overall_max)),
            })
        })
        .collect();
    student_performances.sort_by(|a, b| {
        calc::cmp_desc(a.overall_percent, b.overall_percent).then_with(|| a.roll.cmp(&b.roll))
    });

    let n = config.report_list_size;
    let top_performers = student_performances.iter().take(n).cloned().collect();
    let bottom_performers = student_performances.iter().rev().take(n).cloned().collect();

    let exam_stats = model
        .exam_order
        .iter()
        .map(|exam| {
            let cells = subjects
                .iter()
                .map(|s| {
                    let mut total = 0.0;
                    let mut max = 0.0;
                    let mut high: Option<f64> = None;
                    for ex in model
                        .students
                        .values()
                        .flat_map(|st| st.exams.iter())
                        .filter(|e| &e.exam == exam && e.subject_applies(*s))
                    {
                        let v = ex.scores.get(*s);
                        total += v;
                        max += ex.max_scores.get(*s);
                        high = Some(high.map_or(v, |h| h.max(v)));
                    }
                    (
                        *s,
                        ExamSubjectCell {
                            avg_percent: calc::round_off_2_decimal(calc::percent_of(total, max)),
                            highest_score: high.unwrap_or(0.0),
                        },
                    )
                })
                .collect();
            ExamSubjectRow {
                name: exam.clone(),
                subjects: cells,
            }
        })
        .collect();

    SubjectReport {
        subjects,
        total_students: model.students.len(),
        total_exams: model.exam_order.len(),
        class_averages,
        student_performances,
        top_performers,
        bottom_performers,
        exam_stats,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterStats {
    pub student_count: usize,
    pub exam_count: usize,
    pub total_records: usize,
}

pub fn footer_stats(model: &Model) -> FooterStats {
    FooterStats {
        student_count: model.students.len(),
        exam_count: model.exam_order.len(),
        total_records: model.record_count(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamParticipation {
    pub exam: String,
    pub attempted: usize,
    pub participation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStanding {
    pub roll: String,
    pub name: String,
    pub strong_subjects: SubjectStanding,
    pub weak_subjects: SubjectStanding,
    pub strong_label: String,
    pub weak_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_exams: usize,
    pub total_students: usize,
    pub overall_average: f64,
    pub participation: Vec<ExamParticipation>,
    pub standings: Vec<StudentStanding>,
}

pub fn dashboard_stats(model: &Model) -> DashboardStats {
    let (obtained, max) = model
        .students
        .values()
        .fold((0.0, 0.0), |(o, m), s| (o + s.stats.cum_total, m + s.stats.cum_max));
    let total_students = model.students.len();

    let participation = model
        .exam_order
        .iter()
        .map(|exam| {
            let attempted = model
                .students
                .values()
                .filter(|s| s.attempt(exam).is_some())
                .count();
            ExamParticipation {
                exam: exam.clone(),
                attempted,
                participation_rate: calc::round_off_1_decimal(calc::percent_of(
                    attempted as f64,
                    total_students as f64,
                )),
            }
        })
        .collect();

    let standings = model
        .students
        .values()
        .map(|s| StudentStanding {
            roll: s.roll.clone(),
            name: s.name.clone(),
            strong_subjects: s.stats.strong_subjects.clone(),
            weak_subjects: s.stats.weak_subjects.clone(),
            strong_label: s.stats.strong_subjects.label(&s.stats.subject_averages),
            weak_label: s.stats.weak_subjects.label(&s.stats.subject_averages),
        })
        .collect();

    DashboardStats {
        total_exams: model.exam_order.len(),
        total_students,
        overall_average: calc::round_off_2_decimal(calc::percent_of(obtained, max)),
        participation,
        standings,
    }
}
