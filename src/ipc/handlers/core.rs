use crate::config::SyncConfig;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::workspace;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "subjectOpen": state.subject.is_some(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let config = match SyncConfig::load(&path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_config", format!("{e:#}"), None),
    };
    match workspace::open_workspace(&path) {
        Ok(subject) => {
            tracing::info!(
                workspace = %path.to_string_lossy(),
                subject_loaded = subject.is_some(),
                "workspace selected"
            );
            state.workspace = Some(path.clone());
            state.config = config;
            state.subject = subject;
            state.grade_items.clear();
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "subjectLoaded": state.subject.is_some(),
                }),
            )
        }
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
