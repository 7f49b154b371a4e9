//! JSON side files written after each prediction

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

/// Pretty-print `value` to `path` via a sibling temp file and a rename,
/// creating parent directories when needed.
///
/// Every call gets its own temp file, so concurrent writers never share
/// a descriptor; the last rename wins and the target is always whole.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    if let Err(e) = write_then_rename(&tmp, path, &json).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn write_then_rename(tmp: &Path, path: &Path, json: &[u8]) -> std::io::Result<()> {
    fs::write(tmp, json).await?;
    fs::rename(tmp, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}
