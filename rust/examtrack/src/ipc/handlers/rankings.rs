use crate::ipc::error::ok;
use crate::ipc::helpers::{not_found, optional_usize, parse_filter, parse_subject, required_str};
use crate::ipc::types::{AppState, Request};
use crate::rank;
use serde_json::json;

fn handle_rank_overall(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = match parse_filter(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows = rank::filtered_ranking(state.model(), &filter);
    ok(&req.id, json!({ "filter": filter.label(), "rows": rows }))
}

fn handle_rank_windowed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = match parse_filter(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let window_size = match optional_usize(req, "windowSize", state.config.window_size) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = state.model();
    let exams = rank::window_exams(&model.exam_order, window_size, &filter);
    let rows = rank::windowed_ranking(model, window_size, &filter);
    ok(
        &req.id,
        json!({
            "filter": filter.label(),
            "windowSize": window_size,
            "exams": exams,
            "rows": rows,
        }),
    )
}

fn handle_rank_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject = match parse_subject(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows = rank::subject_ranking(state.model(), subject);
    ok(&req.id, json!({ "subject": subject, "rows": rows }))
}

fn handle_rank_exam(state: &mut AppState, req: &Request) -> serde_json::Value {
    let exam = match required_str(req, "exam") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = state.model();
    if model.exam_position(&exam).is_none() {
        return not_found(req, "exam", &exam);
    }
    let rows = rank::exam_ranking(model, &exam);
    ok(&req.id, json!({ "exam": exam, "rows": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rank.overall" => Some(handle_rank_overall(state, req)),
        "rank.windowed" => Some(handle_rank_windowed(state, req)),
        "rank.subject" => Some(handle_rank_subject(state, req)),
        "rank.exam" => Some(handle_rank_exam(state, req)),
        _ => None,
    }
}
