use crate::model::{StoredFile, Subject};
use anyhow::{anyhow, Context};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SUBJECT_FILE: &str = "subject.json";
pub const FILES_DIR: &str = "files";

pub fn open_workspace(workspace: &Path) -> anyhow::Result<Option<Subject>> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    load_subject(workspace)
}

pub fn load_subject(workspace: &Path) -> anyhow::Result<Option<Subject>> {
    let path = workspace.join(SUBJECT_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let subject = serde_json::from_str(&text)
        .with_context(|| format!("{} is invalid", path.to_string_lossy()))?;
    Ok(Some(subject))
}

pub fn save_subject(workspace: &Path, subject: &Subject) -> anyhow::Result<PathBuf> {
    let path = workspace.join(SUBJECT_FILE);
    let tmp = workspace.join(format!("{SUBJECT_FILE}.saving"));
    let text = serde_json::to_string_pretty(subject).context("failed to serialize subject")?;
    std::fs::write(&tmp, text)
        .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("failed to move subject into {}", path.to_string_lossy()))?;
    Ok(path)
}

/// Copies `src` into the content-addressed file store. Identical content is
/// stored once.
pub fn store_attachment(workspace: &Path, src: &Path) -> anyhow::Result<StoredFile> {
    let file_name = src
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("not a file path: {}", src.to_string_lossy()))?
        .to_string();

    let mut input =
        File::open(src).with_context(|| format!("failed to open {}", src.to_string_lossy()))?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .with_context(|| format!("failed to read {}", src.to_string_lossy()))?;

    let sha256 = hex_digest(&bytes);
    let dir = workspace.join(FILES_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let dst = dir.join(&sha256);
    if !dst.is_file() {
        let mut out = File::create(&dst)
            .with_context(|| format!("failed to create {}", dst.to_string_lossy()))?;
        out.write_all(&bytes)
            .with_context(|| format!("failed to write {}", dst.to_string_lossy()))?;
    }

    Ok(StoredFile {
        file_name,
        sha256,
        size: bytes.len() as u64,
    })
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
