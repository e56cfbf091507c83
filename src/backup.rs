use crate::model::Subject;
use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const SUBJECT_ENTRY: &str = "subject.json";
const FILES_PREFIX: &str = "files/";
pub const BUNDLE_FORMAT_V1: &str = "gradesync-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub files_restored: usize,
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let subject_path = workspace_path.join(SUBJECT_ENTRY);
    if !subject_path.is_file() {
        return Err(anyhow!(
            "workspace subject not found: {}",
            subject_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut stored: Vec<(String, std::path::PathBuf)> = Vec::new();
    let files_dir = workspace_path.join(FILES_PREFIX.trim_end_matches('/'));
    if files_dir.is_dir() {
        for ent in std::fs::read_dir(&files_dir)
            .with_context(|| format!("failed to list {}", files_dir.to_string_lossy()))?
        {
            let p = ent?.path();
            if !p.is_file() {
                continue;
            }
            let Some(name) = p.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            stored.push((format!("{FILES_PREFIX}{name}"), p.clone()));
        }
    }
    stored.sort();

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "fileCount": stored.len(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(SUBJECT_ENTRY, opts)
        .context("failed to start subject entry")?;
    let mut subject_file = File::open(&subject_path)
        .with_context(|| format!("failed to open subject {}", subject_path.to_string_lossy()))?;
    std::io::copy(&mut subject_file, &mut zip).context("failed to write subject entry")?;

    for (entry, path) in &stored {
        zip.start_file(entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {entry}"))?;
        let mut f = File::open(path)
            .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
        std::io::copy(&mut f, &mut zip).with_context(|| format!("failed to write entry {entry}"))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2 + stored.len(),
    })
}

pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        let text = std::fs::read_to_string(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        serde_json::from_str::<Subject>(&text)
            .context("input is neither a bundle nor a subject snapshot")?;
        create_workspace(workspace_path)?;
        replace_subject(workspace_path, &text)?;
        return Ok(ImportSummary {
            bundle_format_detected: "subject-json".to_string(),
            files_restored: 0,
        });
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    // Everything is validated before the workspace is touched.
    let manifest_text = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let subject_text = read_entry(&mut archive, SUBJECT_ENTRY)?;
    serde_json::from_str::<Subject>(&subject_text).context("bundled subject.json is invalid")?;

    create_workspace(workspace_path)?;
    let files_dir = workspace_path.join(FILES_PREFIX.trim_end_matches('/'));
    let mut files_restored = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read bundle entry")?;
        let name = entry.name().to_string();
        let Some(file_name) = name.strip_prefix(FILES_PREFIX) else {
            continue;
        };
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            continue;
        }
        std::fs::create_dir_all(&files_dir).with_context(|| {
            format!("failed to create directory {}", files_dir.to_string_lossy())
        })?;
        let out_path = files_dir.join(file_name);
        let mut out = File::create(&out_path)
            .with_context(|| format!("failed to create {}", out_path.to_string_lossy()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {name}"))?;
        files_restored += 1;
    }

    replace_subject(workspace_path, &subject_text)?;

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        files_restored,
    })
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<String> {
    let mut text = String::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {name}"))?
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {name}"))?;
    Ok(text)
}

fn create_workspace(workspace_path: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })
}

fn replace_subject(workspace_path: &Path, text: &str) -> anyhow::Result<()> {
    let dst = workspace_path.join(SUBJECT_ENTRY);
    let tmp_dst = workspace_path.join("subject.json.importing");
    let mut out = File::create(&tmp_dst).with_context(|| {
        format!(
            "failed to create temp subject {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .context("failed to write extracted subject")?;
    drop(out);
    std::fs::rename(&tmp_dst, &dst).with_context(|| {
        format!(
            "failed to move extracted subject to {}",
            dst.to_string_lossy()
        )
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
