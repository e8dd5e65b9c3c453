mod test_support;

use examtrack::ipc::AppState;
use serde_json::json;
use test_support::{loaded_state, request, request_err, request_ok, row, subject_row, two_student_rows};

#[test]
fn health_reports_load_state() {
    let mut state = AppState::default();
    let h = request_ok(&mut state, "1", "health", json!({}));
    assert_eq!(h["modelLoaded"], json!(false));
    assert!(h["loadedAt"].is_null());

    request_ok(&mut state, "2", "model.load", json!({ "rows": two_student_rows() }));
    let h = request_ok(&mut state, "3", "health", json!({}));
    assert_eq!(h["modelLoaded"], json!(true));
    assert!(h["loadedAt"].is_string());
}

#[test]
fn unknown_method_is_not_implemented() {
    let mut state = AppState::default();
    assert_eq!(request_err(&mut state, "1", "rank.nope", json!({})), "not_implemented");
}

#[test]
fn bad_params_are_rejected() {
    let mut state = loaded_state(two_student_rows());
    assert_eq!(request_err(&mut state, "1", "model.load", json!({})), "bad_params");
    assert_eq!(
        request_err(&mut state, "2", "model.load", json!({ "rows": "nope" })),
        "bad_params"
    );
    assert_eq!(
        request_err(&mut state, "3", "rank.subject", json!({ "subject": "history" })),
        "bad_params"
    );
    assert_eq!(
        request_err(&mut state, "4", "rank.windowed", json!({ "windowSize": -1 })),
        "bad_params"
    );
    assert_eq!(
        request_err(&mut state, "4b", "rank.windowed", json!({ "windowSize": 1.5 })),
        "bad_params"
    );
    assert_eq!(
        request_err(&mut state, "5", "rank.overall", json!({ "filter": 7 })),
        "bad_params"
    );
    assert_eq!(request_err(&mut state, "6", "student.progress", json!({})), "bad_params");
    assert_eq!(
        request_err(&mut state, "7", "config.update", json!({ "windowSize": "three" })),
        "bad_params"
    );
}

#[test]
fn zero_window_selects_no_exams() {
    let mut state = loaded_state(two_student_rows());
    let result = request_ok(&mut state, "1", "rank.windowed", json!({ "windowSize": 0 }));
    assert_eq!(result["windowSize"].as_u64(), Some(0));
    assert_eq!(result["exams"], json!([]));
    let rows = result["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["rank"] == json!("-")));
}

#[test]
fn failed_load_keeps_previous_model() {
    let mut state = loaded_state(two_student_rows());
    request(&mut state, "1", "model.load", json!({ "rows": [1, 2] }));
    let summary = request_ok(&mut state, "2", "model.summary", json!({}));
    assert_eq!(summary["studentCount"].as_u64(), Some(2));
}

#[test]
fn unknown_roll_and_exam_are_not_found() {
    let mut state = loaded_state(two_student_rows());
    for method in ["student.progress", "student.profile", "student.subjectRanks"] {
        let code = request_err(&mut state, "1", method, json!({ "roll": "Z9" }));
        assert_eq!(code, "not_found", "{}", method);
    }
    assert_eq!(
        request_err(&mut state, "2", "rank.exam", json!({ "exam": "E9" })),
        "not_found"
    );
    assert_eq!(
        request_err(
            &mut state,
            "3",
            "student.examRank",
            json!({ "roll": "A1", "exam": "E9" })
        ),
        "not_found"
    );
}

#[test]
fn empty_input_yields_empty_results() {
    let mut state = loaded_state(vec![]);
    let overall = request_ok(&mut state, "1", "rank.overall", json!({}));
    assert_eq!(overall["rows"], json!([]));
    let windowed = request_ok(&mut state, "2", "rank.windowed", json!({}));
    assert_eq!(windowed["exams"], json!([]));
    let diff = request_ok(&mut state, "3", "analytics.examDifficulty", json!({}));
    assert_eq!(diff, json!([]));
    let cats = request_ok(&mut state, "4", "analytics.categorize", json!({}));
    assert_eq!(cats["highPerformers"], json!([]));
    let perf = request_ok(&mut state, "5", "reports.classPerformance", json!({}));
    assert_eq!(perf["stats"]["avgPercentage"].as_f64(), Some(0.0));
    let footer = request_ok(&mut state, "6", "stats.footer", json!({}));
    assert_eq!(footer["studentCount"].as_u64(), Some(0));
}

#[test]
fn queries_before_load_see_empty_model() {
    let mut state = AppState::default();
    let overall = request_ok(&mut state, "1", "rank.overall", json!({}));
    assert_eq!(overall["rows"], json!([]));
}

#[test]
fn unsuccessful_payload_loads_nothing() {
    let mut state = AppState::default();
    let summary = request_ok(
        &mut state,
        "1",
        "model.load",
        json!({ "payload": { "success": false, "message": "sheet unavailable" } }),
    );
    assert_eq!(summary["studentCount"].as_u64(), Some(0));

    let summary = request_ok(
        &mut state,
        "2",
        "model.load",
        json!({ "payload": { "success": true, "data": two_student_rows(), "count": 4 } }),
    );
    assert_eq!(summary["studentCount"].as_u64(), Some(2));
    assert_eq!(summary["recordCount"].as_u64(), Some(4));
}

#[test]
fn malformed_numbers_coerce_to_zero() {
    let mut bad = row("A", "Anu", "E1", 0.0, 100.0);
    bad["total"] = json!("n/a");
    bad["math"] = json!(null);
    let mut state = loaded_state(vec![bad, row("", "Nobody", "E1", 50.0, 100.0)]);
    let overall = request_ok(&mut state, "1", "rank.overall", json!({}));
    assert_eq!(overall["rows"].as_array().map(|r| r.len()), Some(1));
    assert_eq!(overall["rows"][0]["total"].as_f64(), Some(0.0));
    assert_eq!(overall["rows"][0]["rank"], json!("-"));
}

#[test]
fn easy_exam_is_very_easy() {
    let mut state = loaded_state(vec![
        subject_row("A", "E1", [40.0, 42.0, 45.0, 48.0], 50.0),
        subject_row("B", "E1", [44.0, 40.0, 41.0, 50.0], 50.0),
    ]);
    let diff = request_ok(&mut state, "1", "analytics.examDifficulty", json!({}));
    assert_eq!(diff[0]["name"], json!("E1"));
    assert_eq!(diff[0]["difficultyScore"], json!(1));
    assert_eq!(diff[0]["remark"], json!("Very Easy"));
    assert_eq!(diff[0]["perSubjectPercent"]["chem"].as_f64(), Some(84.0));

    let subjects = request_ok(&mut state, "2", "analytics.subjectDifficulty", json!({}));
    assert_eq!(subjects["mostDifficult"], json!("phy"));
}

#[test]
fn class_performance_and_reports() {
    let mut state = loaded_state(vec![
        subject_row("A", "WE 1", [40.0, 40.0, 40.0, 40.0], 50.0),
        subject_row("B", "WE 1", [10.0, 10.0, 5.0, 5.0], 50.0),
        subject_row("A", "RT 1", [25.0, 25.0, 25.0, 25.0], 50.0),
    ]);

    let perf = request_ok(&mut state, "1", "reports.classPerformance", json!({ "filter": "WE" }));
    assert_eq!(perf["exams"], json!(["WE 1"]));
    assert_eq!(perf["filterLabel"], json!("Weekly Exams (WE)"));
    assert_eq!(perf["stats"]["activeStudents"].as_u64(), Some(2));
    assert_eq!(perf["stats"]["passCount"].as_u64(), Some(1));
    assert_eq!(perf["topPerformers"][0]["roll"], json!("A"));
    assert_eq!(perf["atRiskStudents"][0]["roll"], json!("B"));
    assert_eq!(perf["examStats"][0]["studentCount"].as_u64(), Some(2));

    let report = request_ok(&mut state, "2", "reports.subjectReport", json!({ "subject": "bio" }));
    assert_eq!(report["subjects"], json!(["bio"]));
    assert_eq!(report["topPerformers"][0]["roll"], json!("A"));
    assert_eq!(report["examStats"].as_array().map(|e| e.len()), Some(2));

    let all = request_ok(&mut state, "3", "reports.subjectReport", json!({}));
    assert_eq!(all["subjects"].as_array().map(|s| s.len()), Some(4));

    let footer = request_ok(&mut state, "4", "stats.footer", json!({}));
    assert_eq!(footer["studentCount"].as_u64(), Some(2));
    assert_eq!(footer["examCount"].as_u64(), Some(2));
    assert_eq!(footer["totalRecords"].as_u64(), Some(3));
    assert!(footer["lastUpdated"].is_string());

    let dash = request_ok(&mut state, "5", "stats.dashboard", json!({}));
    assert_eq!(dash["participation"][1]["exam"], json!("RT 1"));
    assert_eq!(dash["participation"][1]["participationRate"].as_f64(), Some(50.0));
}

#[test]
fn config_roundtrip() {
    let mut state = AppState::default();
    let cfg = request_ok(&mut state, "1", "config.get", json!({}));
    assert_eq!(cfg["windowSize"].as_u64(), Some(3));

    let cfg = request_ok(&mut state, "2", "config.update", json!({ "passPercent": 50.0 }));
    assert_eq!(cfg["passPercent"].as_f64(), Some(50.0));
    assert_eq!(cfg["failPercent"].as_f64(), Some(35.0));

    let cfg = request_ok(&mut state, "3", "config.clearOverride", json!({}));
    assert_eq!(cfg["passPercent"].as_f64(), Some(60.0));
}
