use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Replace `path` with `contents` via a sibling temp file and a rename, so a
/// failed write never leaves a truncated chart behind.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "chart.svg".into());
    name.push(".tmp");
    path.with_file_name(name)
}
