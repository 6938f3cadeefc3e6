use crate::domain::{ProcarError, ProcarResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$}",
        width = width,
        precision = precision
    )
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> ProcarResult<()> {
    ensure_parent(path)?;
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        ProcarError::io_system(
            "IO.REPORT_WRITE",
            format!("failed to write report '{}': {}", path.display(), source),
        )
    })
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_json_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> ProcarResult<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|source| {
        ProcarError::internal(
            "RUN.JSON_ENCODE",
            format!("failed to encode '{}' as JSON: {}", path.display(), source),
        )
    })?;
    write_text_artifact(path, &rendered)
}

fn ensure_parent(path: &Path) -> ProcarResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| {
                ProcarError::io_system(
                    "IO.REPORT_DIRECTORY",
                    format!(
                        "failed to create report directory '{}': {}",
                        parent.display(),
                        source
                    ),
                )
            })
        }
        _ => Ok(()),
    }
}
