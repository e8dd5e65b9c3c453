//! Exam and subject difficulty from cohort averages.
//!
//! One score/remark mapping is shared by the difficulty table, the class
//! performance summary and the subject table.

use crate::calc;
use crate::model::{Model, Subject, SubjectScores};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Descending average-percent floors for scores 1 to 9; anything below the
/// last floor scores 10.
pub const DIFFICULTY_FLOORS: [f64; 9] = [80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 25.0, 20.0, 15.0];

pub fn difficulty_score(avg_percent: f64) -> u8 {
    DIFFICULTY_FLOORS
        .iter()
        .position(|floor| avg_percent >= *floor)
        .map(|i| (i + 1) as u8)
        .unwrap_or(10)
}

pub fn difficulty_remark(score: u8) -> &'static str {
    match score {
        0..=2 => "Very Easy",
        3 => "Easy",
        4..=5 => "Moderate",
        6..=7 => "Above Average",
        8 => "Tough",
        _ => "Toughest",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDifficulty {
    pub name: String,
    pub per_subject_percent: BTreeMap<Subject, Option<f64>>,
    pub average_percent: f64,
    pub student_count: usize,
    pub difficulty_score: u8,
    pub remark: &'static str,
}

#[derive(Default)]
struct ExamAccumulator {
    scores: SubjectScores,
    maxes: SubjectScores,
    counts: [usize; 4],
    students: usize,
}

fn subject_index(s: Subject) -> usize {
    match s {
        Subject::Chem => 0,
        Subject::Phy => 1,
        Subject::Bio => 2,
        Subject::Math => 3,
    }
}

/// Difficulty for each exam in `exams`, in that order. Subjects without a
/// positive max in an exam are left out of its overall average.
pub fn difficulty_for_exams(model: &Model, exams: &[String]) -> Vec<ExamDifficulty> {
    exams
        .iter()
        .filter_map(|exam| {
            let mut acc = ExamAccumulator::default();
            for student in model.students.values() {
                let Some(ex) = student.attempt(exam) else {
                    continue;
                };
                acc.students += 1;
                for s in Subject::ALL {
                    if ex.max_scores.get(s) > 0.0 {
                        *acc.scores.get_mut(s) += ex.scores.get(s);
                        *acc.maxes.get_mut(s) += ex.max_scores.get(s);
                        acc.counts[subject_index(s)] += 1;
                    }
                }
            }
            if acc.students == 0 {
                return None;
            }

            let mut per_subject_percent = BTreeMap::new();
            let mut with_data: Vec<f64> = Vec::new();
            for s in Subject::ALL {
                let n = acc.counts[subject_index(s)];
                let pct = if n > 0 {
                    let mean_score = acc.scores.get(s) / n as f64;
                    let mean_max = acc.maxes.get(s) / n as f64;
                    Some(calc::percent_of(mean_score, mean_max))
                } else {
                    None
                };
                if let Some(p) = pct {
                    with_data.push(p);
                }
                per_subject_percent.insert(s, pct.map(calc::round_off_1_decimal));
            }

            let average_percent = calc::mean(&with_data);
            let score = difficulty_score(average_percent);
            Some(ExamDifficulty {
                name: exam.clone(),
                per_subject_percent,
                average_percent: calc::round_off_2_decimal(average_percent),
                student_count: acc.students,
                difficulty_score: score,
                remark: difficulty_remark(score),
            })
        })
        .collect()
}

/// The ranked difficulty table, in exam order.
pub fn exam_difficulty(model: &Model) -> Vec<ExamDifficulty> {
    let out = difficulty_for_exams(model, &model.exam_order);
    debug!(exams = out.len(), "exam difficulty");
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDifficulty {
    pub subject: Subject,
    pub name: &'static str,
    pub average_percent: Option<f64>,
    pub difficulty_score: Option<u8>,
    pub remark: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDifficultyTable {
    pub subjects: Vec<SubjectDifficulty>,
    pub most_difficult: Option<Subject>,
}

/// Cohort subject averages (summed totals over summed maxima).
pub fn subject_difficulty(model: &Model) -> SubjectDifficultyTable {
    let mut subjects = Vec::new();
    let mut most_difficult: Option<(Subject, f64)> = None;

    for s in Subject::ALL {
        let (total, max) = model.students.values().fold((0.0, 0.0), |(t, m), st| {
            (
                t + st.stats.subject_totals.get(s),
                m + st.stats.subject_max_totals.get(s),
            )
        });
        let avg = (max > 0.0).then(|| calc::round_off_2_decimal(calc::percent_of(total, max)));
        if let Some(a) = avg {
            if a > 0.0 && most_difficult.map(|(_, m)| a < m).unwrap_or(true) {
                most_difficult = Some((s, a));
            }
        }
        let score = avg.map(difficulty_score);
        subjects.push(SubjectDifficulty {
            subject: s,
            name: s.display_name(),
            average_percent: avg,
            difficulty_score: score,
            remark: score.map(difficulty_remark).unwrap_or("No Data"),
        });
    }

    SubjectDifficultyTable {
        subjects,
        most_difficult: most_difficult.map(|(s, _)| s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_model, ExamRecord};

    fn row(roll: &str, exam: &str, chem: f64, phy: f64, max_chem: f64, max_phy: f64) -> ExamRecord {
        ExamRecord {
            roll: roll.to_string(),
            name: roll.to_string(),
            exam: exam.to_string(),
            chem,
            phy,
            max_chem,
            max_phy,
            total: chem + phy,
            max_total: max_chem + max_phy,
            ..ExamRecord::default()
        }
    }

    #[test]
    fn score_boundaries() {
        assert_eq!(difficulty_score(100.0), 1);
        assert_eq!(difficulty_score(80.0), 1);
        assert_eq!(difficulty_score(79.99), 2);
        assert_eq!(difficulty_score(50.0), 4);
        assert_eq!(difficulty_score(25.0), 7);
        assert_eq!(difficulty_score(15.0), 9);
        assert_eq!(difficulty_score(14.99), 10);
        assert_eq!(difficulty_score(0.0), 10);
    }

    #[test]
    fn remark_bands() {
        assert_eq!(difficulty_remark(1), "Very Easy");
        assert_eq!(difficulty_remark(2), "Very Easy");
        assert_eq!(difficulty_remark(3), "Easy");
        assert_eq!(difficulty_remark(5), "Moderate");
        assert_eq!(difficulty_remark(7), "Above Average");
        assert_eq!(difficulty_remark(8), "Tough");
        assert_eq!(difficulty_remark(10), "Toughest");
    }

    #[test]
    fn zero_max_subjects_are_not_averaged_in() {
        // phy has no max in E1; chem averages 90%.
        let model = build_model(&[row("A", "E1", 36.0, 0.0, 40.0, 0.0), row("B", "E1", 36.0, 0.0, 40.0, 0.0)]);
        let d = exam_difficulty(&model);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].per_subject_percent[&Subject::Chem], Some(90.0));
        assert_eq!(d[0].per_subject_percent[&Subject::Phy], None);
        assert_eq!(d[0].difficulty_score, 1);
        assert_eq!(d[0].remark, "Very Easy");
    }

    #[test]
    fn exams_follow_exam_order() {
        let model = build_model(&[
            row("A", "E2", 10.0, 10.0, 40.0, 40.0),
            row("A", "E1", 30.0, 30.0, 40.0, 40.0),
        ]);
        let names: Vec<String> = exam_difficulty(&model).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["E2", "E1"]);
    }

    #[test]
    fn most_difficult_subject_is_lowest_positive_average() {
        let model = build_model(&[row("A", "E1", 10.0, 30.0, 40.0, 40.0)]);
        let t = subject_difficulty(&model);
        assert_eq!(t.most_difficult, Some(Subject::Chem));
        let bio = t.subjects.iter().find(|s| s.subject == Subject::Bio).expect("bio");
        assert_eq!(bio.average_percent, None);
        assert_eq!(bio.remark, "No Data");
    }
}
