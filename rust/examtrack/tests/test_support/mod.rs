#![allow(dead_code)]

use examtrack::ipc::{handle_request, AppState, Request};
use serde_json::json;

/// A flat row where every mark sits in math.
pub fn row(roll: &str, name: &str, exam: &str, total: f64, max_total: f64) -> serde_json::Value {
    let percent = if max_total > 0.0 { total / max_total * 100.0 } else { 0.0 };
    json!({
        "roll": roll,
        "name": name,
        "exam": exam,
        "chem": 0,
        "phy": 0,
        "bio": 0,
        "math": total,
        "total": total,
        "percent": percent,
        "maxTotal": max_total,
        "maxChem": 0,
        "maxPhy": 0,
        "maxBio": 0,
        "maxMath": max_total,
    })
}

/// A row with one mark per subject, each out of `max_each`.
pub fn subject_row(
    roll: &str,
    exam: &str,
    marks: [f64; 4],
    max_each: f64,
) -> serde_json::Value {
    let total: f64 = marks.iter().sum();
    json!({
        "roll": roll,
        "name": format!("Student {}", roll),
        "exam": exam,
        "chem": marks[0],
        "phy": marks[1],
        "bio": marks[2],
        "math": marks[3],
        "total": total,
        "percent": total / (max_each * 4.0) * 100.0,
        "maxTotal": max_each * 4.0,
        "maxChem": max_each,
        "maxPhy": max_each,
        "maxBio": max_each,
        "maxMath": max_each,
    })
}

pub fn request(state: &mut AppState, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let req: Request = serde_json::from_value(json!({
        "id": id,
        "method": method,
        "params": params,
    }))
    .expect("build request");
    let value = handle_request(state, req);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(state: &mut AppState, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let value = request(state, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Error code of a failed request.
pub fn request_err(state: &mut AppState, id: &str, method: &str, params: serde_json::Value) -> String {
    let value = request(state, id, method, params);
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{} succeeded: {}", method, value);
    value["error"]["code"].as_str().unwrap_or_default().to_string()
}

pub fn loaded_state(rows: Vec<serde_json::Value>) -> AppState {
    let mut state = AppState::default();
    request_ok(&mut state, "load", "model.load", json!({ "rows": rows }));
    state
}

/// Two students over two exams: A1 80 then 90, A2 60 then 95.
pub fn two_student_rows() -> Vec<serde_json::Value> {
    vec![
        row("A1", "Asha", "E1", 80.0, 100.0),
        row("A2", "Bilal", "E1", 60.0, 100.0),
        row("A1", "Asha", "E2", 90.0, 100.0),
        row("A2", "Bilal", "E2", 95.0, 100.0),
    ]
}
