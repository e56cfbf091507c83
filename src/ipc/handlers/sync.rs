use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::params::{get_opt_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::sync::{self, ActionSet, SnapshotConnector, SyncError};
use crate::workspace;
use serde_json::{json, Value};

fn parse_actions(params: &Value) -> Result<ActionSet, HandlerErr> {
    let Some(raw) = params.get("actions") else {
        return Ok(ActionSet::default());
    };
    let Some(items) = raw.as_array() else {
        return Err(HandlerErr::bad_params("actions must be an array of strings"));
    };
    let mut tags = Vec::with_capacity(items.len());
    for item in items {
        let Some(tag) = item.as_str() else {
            return Err(HandlerErr::bad_params("actions must be an array of strings"));
        };
        tags.push(tag);
    }
    ActionSet::parse(tags).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

fn snapshot_connector(params: &Value) -> Result<SnapshotConnector, HandlerErr> {
    let driver = params
        .get("driver")
        .ok_or_else(|| HandlerErr::bad_params("missing driver"))?;
    match get_opt_str(driver, "kind").as_deref() {
        Some("snapshot") => {
            let path = get_required_str(driver, "path")?;
            Ok(SnapshotConnector::new(path))
        }
        Some(other) => Err(HandlerErr::bad_params(format!("unsupported driver: {other}"))),
        None => Err(HandlerErr::bad_params("missing driver.kind")),
    }
}

fn sync_error(e: SyncError) -> HandlerErr {
    HandlerErr::new("sync_failed", e.to_string())
        .with_details(json!({ "stage": e.stage().map(|s| s.as_str()) }))
}

fn handle_sync_run(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let actions = parse_actions(&req.params)?;
    let course_url = get_required_str(&req.params, "courseUrl")?;
    let connector = snapshot_connector(&req.params)?;

    let Some(subject) = state.subject.as_mut() else {
        return Err(HandlerErr::new("no_subject", "create or load a subject first"));
    };
    let outcome =
        sync::run_grade_item_sync(&connector, &state.config, actions, subject, &course_url)
            .map_err(sync_error)?;

    let mut saved = false;
    if let Some(workspace_path) = state.workspace.as_ref() {
        if let Err(e) = workspace::save_subject(workspace_path, subject) {
            tracing::error!(error = %format!("{e:#}"), "failed to save subject after sync");
        } else {
            saved = true;
        }
    }

    let items: Vec<Value> = outcome.grade_items.iter().map(|i| i.to_json()).collect();
    state.grade_items = outcome.grade_items;
    Ok(json!({
        "columns": outcome.value.columns,
        "matched": outcome.value.matched,
        "saved": saved,
        "gradeItems": items,
    }))
}

fn handle_sync_grade_items(state: &mut AppState) -> Result<Value, HandlerErr> {
    let items: Vec<Value> = state.grade_items.iter().map(|i| i.to_json()).collect();
    Ok(json!({ "gradeItems": items }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "sync.run" => handle_sync_run(state, req),
        "sync.gradeItems" => handle_sync_grade_items(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
