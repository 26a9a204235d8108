use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::info;

/// Find the most recently modified save file in `dir`.
///
/// Save files are named `GameSave*_GD.sav`. Returns `None` when the
/// directory is unreadable or holds no matching file; discovery is a
/// convenience for pre-filling file pickers and never an error.
pub fn latest_save_in(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            continue;
        };
        if !is_save_file_name(name) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }

    let found = newest.map(|(_, path)| path);
    match &found {
        Some(path) => info!("most recent save file: {}", path.display()),
        None => info!("no save files found in {}", dir.display()),
    }
    found
}

fn is_save_file_name(name: &str) -> bool {
    name.len() > "GameSave_GD.sav".len() - 1
        && name.starts_with("GameSave")
        && name.ends_with("_GD.sav")
}
