use crate::ipc::error::ok_value;
use crate::ipc::types::{AppState, Request};
use crate::{difficulty, trend};

fn handle_categorize(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &trend::categorize(state.model(), &state.config))
}

fn handle_alerts(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &trend::generate_alerts(state.model(), &state.config))
}

fn handle_exam_difficulty(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &difficulty::exam_difficulty(state.model()))
}

fn handle_subject_difficulty(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &difficulty::subject_difficulty(state.model()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.categorize" => Some(handle_categorize(state, req)),
        "analytics.alerts" => Some(handle_alerts(state, req)),
        "analytics.examDifficulty" => Some(handle_exam_difficulty(state, req)),
        "analytics.subjectDifficulty" => Some(handle_subject_difficulty(state, req)),
        _ => None,
    }
}
