use crate::ipc::error::{engine_err, err};
use crate::ipc::types::Request;
use crate::model::Subject;
use crate::rank::ExamFilter;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn parse_filter(req: &Request) -> Result<ExamFilter, serde_json::Value> {
    ExamFilter::parse(req.params.get("filter")).map_err(|e| engine_err(&req.id, e))
}

pub fn parse_subject(req: &Request) -> Result<Subject, serde_json::Value> {
    let raw = required_str(req, "subject")?;
    Subject::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("unknown subject: {}", raw),
            Some(serde_json::json!({ "allowed": Subject::ALL.map(Subject::key) })),
        )
    })
}

/// Non-negative integer param, `default` when absent.
pub fn optional_usize(req: &Request, key: &str, default: usize) -> Result<usize, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("{} must be a non-negative integer", key),
                    None,
                )
            }),
    }
}

pub fn not_found(req: &Request, what: &str, key: &str) -> serde_json::Value {
    err(
        &req.id,
        "not_found",
        format!("{} not found", what),
        Some(serde_json::json!({ what: key })),
    )
}
