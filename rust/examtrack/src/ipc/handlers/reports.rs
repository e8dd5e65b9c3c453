use crate::ipc::error::{err, ok, ok_value};
use crate::ipc::helpers::parse_filter;
use crate::ipc::types::{AppState, Request};
use crate::model::Subject;
use crate::reports;
use serde_json::json;

fn handle_class_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = match parse_filter(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok_value(
        &req.id,
        &reports::class_performance(state.model(), &filter, &state.config),
    )
}

/// `subject` is a subject key or "all"; absent means all.
fn handle_subject_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = req
        .params
        .get("subject")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("all");
    let subject = if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        None
    } else {
        match Subject::parse(raw) {
            Some(s) => Some(s),
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("unknown subject: {}", raw),
                    None,
                )
            }
        }
    };
    ok_value(
        &req.id,
        &reports::subject_report(state.model(), subject, &state.config),
    )
}

fn handle_footer(state: &mut AppState, req: &Request) -> serde_json::Value {
    let footer = reports::footer_stats(state.model());
    ok(
        &req.id,
        json!({
            "studentCount": footer.student_count,
            "examCount": footer.exam_count,
            "totalRecords": footer.total_records,
            "lastUpdated": state.loaded_at.map(|t| t.to_rfc3339()),
        }),
    )
}

fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &reports::dashboard_stats(state.model()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.classPerformance" => Some(handle_class_performance(state, req)),
        "reports.subjectReport" => Some(handle_subject_report(state, req)),
        "stats.footer" => Some(handle_footer(state, req)),
        "stats.dashboard" => Some(handle_dashboard(state, req)),
        _ => None,
    }
}
