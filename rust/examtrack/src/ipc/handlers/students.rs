use crate::ipc::error::{ok, ok_value};
use crate::ipc::helpers::{not_found, required_str};
use crate::ipc::types::{AppState, Request};
use crate::{rank, trend};
use serde_json::json;

fn handle_student_subject_ranks(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match rank::subject_ranks_for_student(state.model(), &roll) {
        Some(ranks) => ok(&req.id, json!({ "roll": roll, "subjects": ranks })),
        None => not_found(req, "roll", &roll),
    }
}

fn handle_student_progress(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match trend::progress_for_student(state.model(), &roll) {
        Some(progress) => ok(&req.id, json!({ "roll": roll, "progress": progress })),
        None => not_found(req, "roll", &roll),
    }
}

fn handle_student_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match trend::student_profile(state.model(), &roll) {
        Some(profile) => ok_value(&req.id, &profile),
        None => not_found(req, "roll", &roll),
    }
}

/// `rank` is null when the student sat no qualifying record for the exam.
fn handle_student_exam_rank(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam = match required_str(req, "exam") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = state.model();
    if model.student(&roll).is_none() {
        return not_found(req, "roll", &roll);
    }
    if model.exam_position(&exam).is_none() {
        return not_found(req, "exam", &exam);
    }
    let rank = rank::exam_rank_for_student(model, &roll, &exam);
    ok(&req.id, json!({ "roll": roll, "exam": exam, "rank": rank }))
}

/// A missing or blank query returns no rows.
fn handle_student_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let rows = rank::search_students(state.model(), &query);
    ok(
        &req.id,
        json!({ "query": query, "count": rows.len(), "rows": rows }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "student.subjectRanks" => Some(handle_student_subject_ranks(state, req)),
        "student.progress" => Some(handle_student_progress(state, req)),
        "student.profile" => Some(handle_student_profile(state, req)),
        "student.examRank" => Some(handle_student_exam_rank(state, req)),
        "student.search" => Some(handle_student_search(state, req)),
        _ => None,
    }
}
