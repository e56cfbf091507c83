use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "gradesync.json";
pub const LOG_ENV: &str = "GRADESYNC_LOG";

/// Remote gradebook layout. Every field has a default so a missing or
/// partial `gradesync.json` is fine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub settings_link_text: String,
    pub report_link_text: String,
    pub header_selector: String,
    pub final_exam_keyword: String,
    pub quiz_path_segment: String,
    pub assign_path_segment: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settings_link_text: "Nastavenie hodnotenia".to_string(),
            report_link_text: "Výkaz používateľa".to_string(),
            header_selector: ".gradeitemheader".to_string(),
            final_exam_keyword: "skuska".to_string(),
            quiz_path_segment: "quiz".to_string(),
            assign_path_segment: "assign".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is invalid", path.to_string_lossy()))
    }
}
