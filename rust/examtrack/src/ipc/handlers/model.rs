use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{build_model, rows_from_payload};
use chrono::Utc;
use serde_json::json;
use tracing::info;

fn summary_json(state: &AppState) -> serde_json::Value {
    let model = state.model();
    json!({
        "studentCount": model.students.len(),
        "examOrder": model.exam_order,
        "recordCount": model.record_count(),
        "loadedAt": state.loaded_at.map(|t| t.to_rfc3339()),
    })
}

/// Rebuilds the whole model from `rows` (a bare array) or `payload` (the
/// ingestion envelope). The previous model stays in place if parsing fails.
fn handle_model_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let source = match (req.params.get("rows"), req.params.get("payload")) {
        (Some(rows), _) => rows,
        (None, Some(payload)) => payload,
        (None, None) => return err(&req.id, "bad_params", "missing rows or payload", None),
    };
    let rows = match rows_from_payload(source) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("{e:#}"), None),
    };

    let model = build_model(&rows);
    state.model = Some(model);
    state.loaded_at = Some(Utc::now());
    info!(rows = rows.len(), "model swapped in");
    ok(&req.id, summary_json(state))
}

fn handle_model_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, summary_json(state))
}

fn handle_model_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.model = None;
    state.loaded_at = None;
    info!("model cleared");
    ok(&req.id, json!({ "cleared": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "model.load" => Some(handle_model_load(state, req)),
        "model.summary" => Some(handle_model_summary(state, req)),
        "model.clear" => Some(handle_model_clear(state, req)),
        _ => None,
    }
}
