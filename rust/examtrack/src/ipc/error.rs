use crate::calc::EngineError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn engine_err(id: &str, e: EngineError) -> serde_json::Value {
    err(id, &e.code, e.message, e.details)
}

/// Serializes an engine result into an `ok` envelope.
pub fn ok_value<T: serde::Serialize>(id: &str, value: &T) -> serde_json::Value {
    match serde_json::to_value(value) {
        Ok(v) => ok(id, v),
        Err(e) => err(id, "serialize_failed", e.to_string(), None),
    }
}
