mod test_support;

use serde_json::json;
use test_support::{loaded_state, request_ok, row, two_student_rows};

fn rolls(rows: &serde_json::Value) -> Vec<String> {
    rows.as_array()
        .expect("rows array")
        .iter()
        .map(|r| r["roll"].as_str().expect("roll").to_string())
        .collect()
}

#[test]
fn two_student_overall_ranking() {
    let mut state = loaded_state(two_student_rows());

    let summary = request_ok(&mut state, "1", "model.summary", json!({}));
    assert_eq!(summary["examOrder"], json!(["E1", "E2"]));
    assert_eq!(summary["studentCount"].as_u64(), Some(2));

    let result = request_ok(&mut state, "2", "rank.overall", json!({}));
    let rows = &result["rows"];
    assert_eq!(rolls(rows), vec!["A1", "A2"]);
    assert_eq!(rows[0]["rank"], json!(1));
    assert_eq!(rows[0]["total"].as_f64(), Some(170.0));
    assert_eq!(rows[0]["examsAttempted"].as_u64(), Some(2));
    assert_eq!(rows[1]["rank"], json!(2));
    assert_eq!(rows[1]["total"].as_f64(), Some(155.0));
}

#[test]
fn windowed_ranking_uses_last_three_exams() {
    let mut rows = Vec::new();
    for (i, exam) in ["E1", "E2", "E3", "E4", "E5"].iter().enumerate() {
        // A leads early, B leads late.
        let a = if i < 2 { 100.0 } else { 10.0 };
        let b = if i < 2 { 10.0 } else { 50.0 };
        rows.push(row("A", "Anu", exam, a, 100.0));
        rows.push(row("B", "Ben", exam, b, 100.0));
    }
    let mut state = loaded_state(rows);

    let result = request_ok(&mut state, "1", "rank.windowed", json!({ "windowSize": 3 }));
    assert_eq!(result["exams"], json!(["E3", "E4", "E5"]));
    assert_eq!(rolls(&result["rows"]), vec!["B", "A"]);
    assert_eq!(result["rows"][0]["total"].as_f64(), Some(150.0));
    assert_eq!(result["rows"][1]["total"].as_f64(), Some(30.0));

    // Overall still favours A: 230 vs 170.
    let overall = request_ok(&mut state, "2", "rank.overall", json!({}));
    assert_eq!(rolls(&overall["rows"]), vec!["A", "B"]);
}

#[test]
fn windowed_ranking_defaults_to_configured_size() {
    let rows = vec![
        row("A", "Anu", "WE 1", 40.0, 100.0),
        row("A", "Anu", "WE 2", 40.0, 100.0),
        row("A", "Anu", "RT 1", 40.0, 100.0),
        row("A", "Anu", "WE 3", 40.0, 100.0),
        row("A", "Anu", "WE 4", 40.0, 100.0),
    ];
    let mut state = loaded_state(rows);
    request_ok(&mut state, "cfg", "config.update", json!({ "windowSize": 2 }));

    let result = request_ok(&mut state, "1", "rank.windowed", json!({ "filter": "WE" }));
    assert_eq!(result["windowSize"].as_u64(), Some(2));
    assert_eq!(result["exams"], json!(["WE 3", "WE 4"]));
}

#[test]
fn ties_break_by_roll_and_zero_scores_are_unranked() {
    let mut state = loaded_state(vec![
        row("C3", "Chitra", "E1", 50.0, 100.0),
        row("B2", "Babu", "E1", 50.0, 100.0),
        row("A1", "Appu", "E1", 0.0, 100.0),
    ]);
    let result = request_ok(&mut state, "1", "rank.overall", json!({}));
    let rows = &result["rows"];
    assert_eq!(rolls(rows), vec!["B2", "C3", "A1"]);
    assert_eq!(rows[0]["rank"], json!(1));
    assert_eq!(rows[1]["rank"], json!(2));
    assert_eq!(rows[2]["rank"], json!("-"));
}

#[test]
fn category_filter_restricts_overall_ranking() {
    let mut state = loaded_state(vec![
        row("A", "Anu", "RT 1", 90.0, 100.0),
        row("B", "Ben", "RT 1", 10.0, 100.0),
        row("A", "Anu", "MT 1", 10.0, 100.0),
        row("B", "Ben", "MT 1", 95.0, 100.0),
    ]);
    let result = request_ok(&mut state, "1", "rank.overall", json!({ "filter": "MT" }));
    assert_eq!(result["filter"], json!("MT"));
    assert_eq!(rolls(&result["rows"]), vec!["B", "A"]);
    assert_eq!(result["rows"][0]["examsAttempted"].as_u64(), Some(1));
}

#[test]
fn subject_ranking_skips_students_without_the_subject() {
    let mut chem_only = row("C", "Chitra", "E1", 30.0, 50.0);
    chem_only["maxMath"] = json!(0);
    chem_only["math"] = json!(0);
    chem_only["chem"] = json!(30);
    chem_only["maxChem"] = json!(50);
    let mut state = loaded_state(vec![
        row("A", "Anu", "E1", 40.0, 50.0),
        row("B", "Ben", "E1", 45.0, 50.0),
        chem_only,
    ]);

    let math = request_ok(&mut state, "1", "rank.subject", json!({ "subject": "math" }));
    assert_eq!(rolls(&math["rows"]), vec!["B", "A"]);

    let chem = request_ok(&mut state, "2", "rank.subject", json!({ "subject": "CHEMISTRY" }));
    assert_eq!(rolls(&chem["rows"]), vec!["C"]);
}

#[test]
fn exam_ranking_lists_subject_cells() {
    let mut state = loaded_state(two_student_rows());
    let result = request_ok(&mut state, "1", "rank.exam", json!({ "exam": "E2" }));
    let rows = &result["rows"];
    assert_eq!(rolls(rows), vec!["A2", "A1"]);
    assert_eq!(rows[0]["subjects"]["math"]["score"].as_f64(), Some(95.0));
    assert!(rows[0]["subjects"]["chem"].is_null());
    assert_eq!(rows[0]["percent"].as_f64(), Some(95.0));
}

#[test]
fn rankings_are_stable_across_reloads() {
    let mut state = loaded_state(two_student_rows());
    let first = request_ok(&mut state, "1", "rank.overall", json!({}));
    let first_model = state.model.clone();

    request_ok(&mut state, "2", "model.load", json!({ "rows": two_student_rows() }));
    let second = request_ok(&mut state, "3", "rank.overall", json!({}));

    assert_eq!(first, second);
    assert_eq!(first_model, state.model);
}

#[test]
fn student_lookups_report_exam_and_subject_ranks() {
    let mut state = loaded_state(two_student_rows());

    let rank = request_ok(
        &mut state,
        "1",
        "student.examRank",
        json!({ "roll": "A1", "exam": "E1" }),
    );
    assert_eq!(rank["rank"], json!(1));

    let subjects = request_ok(&mut state, "2", "student.subjectRanks", json!({ "roll": "A2" }));
    assert_eq!(subjects["subjects"]["math"]["rank"], json!(2));
    assert_eq!(subjects["subjects"]["math"]["total"].as_f64(), Some(155.0));
    assert_eq!(subjects["subjects"]["bio"]["rank"], json!("-"));
}

#[test]
fn windowed_exam_counts_only_qualifying_records() {
    let mut state = loaded_state(vec![
        row("A", "Anu", "E1", 40.0, 100.0),
        row("B", "Ben", "E1", 50.0, 100.0),
        row("A", "Anu", "E2", 70.0, 100.0),
        row("B", "Ben", "E2", 0.0, 0.0),
    ]);
    let result = request_ok(&mut state, "1", "rank.windowed", json!({ "windowSize": 1 }));
    assert_eq!(result["exams"], json!(["E2"]));
    let rows = &result["rows"];
    assert_eq!(rolls(rows), vec!["A", "B"]);
    assert_eq!(rows[0]["rank"], json!(1));
    assert_eq!(rows[1]["total"].as_f64(), Some(0.0));
    assert_eq!(rows[1]["examsAttempted"].as_u64(), Some(0));
    assert_eq!(rows[1]["rank"], json!("-"));
}

#[test]
fn student_search_matches_name_or_roll() {
    let mut state = loaded_state(vec![
        row("A1", "Asha", "E1", 80.0, 100.0),
        row("A2", "Bilal", "E1", 60.0, 100.0),
        row("B7", "Sasha", "E1", 90.0, 100.0),
    ]);

    let result = request_ok(&mut state, "1", "student.search", json!({ "query": "SHA" }));
    assert_eq!(result["count"].as_u64(), Some(2));
    assert_eq!(rolls(&result["rows"]), vec!["B7", "A1"]);
    assert_eq!(result["rows"][1]["rank"], json!(2));

    let result = request_ok(&mut state, "2", "student.search", json!({ "query": "a2" }));
    assert_eq!(rolls(&result["rows"]), vec!["A2"]);

    let result = request_ok(&mut state, "3", "student.search", json!({ "query": "" }));
    assert_eq!(result["rows"], json!([]));
    let result = request_ok(&mut state, "4", "student.search", json!({}));
    assert_eq!(result["count"].as_u64(), Some(0));
}
