use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::{PointsTarget, Subject};
use serde_json::Value;
use std::path::PathBuf;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    get_opt_str(params, key).ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing integer {}", key)))
}

pub fn get_opt_i64(params: &Value, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}

pub fn get_opt_f64(params: &Value, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.as_f64())
}

/// `{"kind": "test" | "homework" | "finalExam", "id": n}`
pub fn parse_target(params: &Value) -> Result<PointsTarget, HandlerErr> {
    let target = params
        .get("target")
        .ok_or_else(|| HandlerErr::bad_params("missing target"))?;
    let id = get_required_i64(target, "id")?;
    match target.get("kind").and_then(|v| v.as_str()) {
        Some("test") => Ok(PointsTarget::Test(id)),
        Some("homework") => Ok(PointsTarget::HomeWork(id)),
        Some("finalExam") => Ok(PointsTarget::FinalExam(id)),
        _ => Err(HandlerErr::bad_params("invalid target.kind")),
    }
}

pub fn require_subject(state: &mut AppState) -> Result<&mut Subject, HandlerErr> {
    state
        .subject
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_subject", "create or load a subject first"))
}

pub fn require_workspace(state: &AppState) -> Result<PathBuf, HandlerErr> {
    state
        .workspace
        .clone()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}
