use crate::config::AnalyticsConfig;
use crate::ipc::error::{err, ok, ok_value};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "modelLoaded": state.model.is_some(),
            "loadedAt": state.loaded_at.map(|t| t.to_rfc3339()),
        }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok_value(&req.id, &state.config)
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !req.params.is_object() {
        return err(&req.id, "bad_params", "params must be an object", None);
    }
    match state.config.merged(&req.params) {
        Ok(cfg) => {
            state.config = cfg;
            info!("analytics config updated");
            ok_value(&req.id, &state.config)
        }
        Err(e) => err(&req.id, "bad_params", e.to_string(), None),
    }
}

fn handle_config_clear_override(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.config = AnalyticsConfig::default();
    info!("analytics config reset to defaults");
    ok_value(&req.id, &state.config)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        "config.clearOverride" => Some(handle_config_clear_override(state, req)),
        _ => None,
    }
}
