use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::EngineError;

/// Subfolder under the system temp dir where backups accumulate.
const BACKUP_SUBDIR: &str = "tidesave_backups";

/// Copy the current on-disk bytes of `original` to a timestamped backup
/// and return the backup's path.
///
/// This runs before the destructive write and copies the file, not the
/// in-memory document, so a failed or buggy write is always recoverable
/// from an untouched copy of what was on disk. A same-named prior backup
/// (timestamp collision within one second) is overwritten.
pub fn back_up(original: &Path) -> Result<PathBuf, EngineError> {
    let dir = resolve_backup_dir(original)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = dir.join(backup_file_name(original, &timestamp));
    fs::copy(original, &backup_path).map_err(|source| EngineError::Backup {
        path: original.display().to_string(),
        source,
    })?;
    info!("original save backed up to {}", backup_path.display());
    Ok(backup_path)
}

/// `<stem>_<timestamp><extension>` of the original file.
fn backup_file_name(original: &Path, timestamp: &str) -> String {
    let stem = original
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("save");
    match original.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{stem}_{timestamp}.{ext}"),
        None => format!("{stem}_{timestamp}"),
    }
}

/// Prefer a tool-specific subfolder of the system temp dir; fall back to
/// a `backups` folder beside the original if that can't be created.
fn resolve_backup_dir(original: &Path) -> Result<PathBuf, EngineError> {
    let preferred = std::env::temp_dir().join(BACKUP_SUBDIR);
    if fs::create_dir_all(&preferred).is_ok() {
        return Ok(preferred);
    }
    warn!(
        "temp backup dir {} unavailable; falling back beside the save file",
        preferred.display()
    );
    let fallback = original
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("backups");
    fs::create_dir_all(&fallback)?;
    Ok(fallback)
}
