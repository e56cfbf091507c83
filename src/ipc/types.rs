use std::path::PathBuf;

use serde::Deserialize;

use crate::config::SyncConfig;
use crate::model::Subject;
use crate::sync::RemoteGradeItem;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub subject: Option<Subject>,
    pub config: SyncConfig,
    pub grade_items: Vec<RemoteGradeItem>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            subject: None,
            config: SyncConfig::default(),
            grade_items: Vec::new(),
        }
    }
}
