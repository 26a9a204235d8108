pub mod backup;
pub mod discover;
pub mod error;
pub mod reconcile;

pub use error::EngineError;
pub use reconcile::{PassReport, SynthDefaults};

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::Value;

use tidesave_core::{SAVE_KEY, SaveDocument, codec};

/// Ceiling applied to currency setters; values above this overflow or
/// break the game's display.
pub const MAX_CURRENCY: i64 = 999_999_999;

/// Staff are levelled to this by [`SaveEngine::max_staff_levels`].
pub const STAFF_MAX_LEVEL: i64 = 20;

// Section and field names below are the save file's wire format.
const PLAYER_INFO: &str = "PlayerInfo";
const GOLD: &str = "m_Gold";
const BEI: &str = "m_Bei";
const CHEF_FLAME: &str = "m_ChefFlame";
const SNS_INFO: &str = "SNSInfo";
const FOLLOW_COUNT: &str = "m_Follow_Count";
const STAFF: &str = "Staff";
const STAFF_NAME: &str = "name";
const STAFF_LEVEL: &str = "level";

/// The player character appears in the staff roster but is not levelled.
const PLAYER_STAFF_NAME: &str = "Staff_Dave";

pub(crate) const INGREDIENTS: &str = "Ingredients";
pub(crate) const MATERIALS: &str = "InventoryItemSlot";

/// The save-editing context: the loaded document, its source path, and
/// the loaded flag. One instance edits one document at a time; there is
/// no shared mutable state behind it.
#[derive(Default)]
pub struct SaveEngine {
    document: SaveDocument,
    source_path: Option<PathBuf>,
    loaded: bool,
}

impl SaveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only after every step of a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut SaveDocument {
        &mut self.document
    }

    /// Load a save file: read raw bytes, strip the obfuscation layer,
    /// parse the document text.
    ///
    /// Any failure leaves the previously loaded document (if any) fully
    /// intact; the new state is only swapped in once every step has
    /// succeeded.
    pub fn open(&mut self, path: &Path) -> Result<(), EngineError> {
        info!("loading save file: {}", path.display());
        let raw = fs::read(path)?;
        info!("read {} bytes from file", raw.len());
        let text = codec::decode(&raw, SAVE_KEY)?;
        let document = SaveDocument::parse(&text)?;

        self.document = document;
        self.source_path = Some(path.to_path_buf());
        self.loaded = true;
        info!("save document parsed successfully");
        Ok(())
    }

    /// Write the document back to its source path, backing up the
    /// current on-disk bytes first. Returns the backup's path.
    ///
    /// Order matters: the backup copy happens before anything touches
    /// the original, so if the final write fails the pre-write bytes
    /// still exist on disk.
    pub fn write(&mut self) -> Result<PathBuf, EngineError> {
        let Some(path) = self.source_path.clone().filter(|_| self.loaded) else {
            warn!("attempted to write a save file, but none is loaded");
            return Err(EngineError::NoSaveLoaded);
        };

        info!("writing save file: {}", path.display());
        let backup_path = backup::back_up(&path)?;

        let text = self.document.to_text()?;
        let encoded = codec::encode(&text, SAVE_KEY)?;
        fs::write(&path, encoded)?;

        info!("save file written to {}", path.display());
        Ok(backup_path)
    }

    // ========================================================================
    // Currency and scalar fields
    // ========================================================================

    pub fn gold(&self) -> i64 {
        self.scalar(PLAYER_INFO, GOLD)
    }

    pub fn bei(&self) -> i64 {
        self.scalar(PLAYER_INFO, BEI)
    }

    pub fn artisans_flame(&self) -> i64 {
        self.scalar(PLAYER_INFO, CHEF_FLAME)
    }

    pub fn follower_count(&self) -> i64 {
        self.scalar(SNS_INFO, FOLLOW_COUNT)
    }

    pub fn set_gold(&mut self, value: i64) -> bool {
        self.set_currency(PLAYER_INFO, GOLD, value)
    }

    pub fn set_bei(&mut self, value: i64) -> bool {
        self.set_currency(PLAYER_INFO, BEI, value)
    }

    pub fn set_artisans_flame(&mut self, value: i64) -> bool {
        self.set_currency(PLAYER_INFO, CHEF_FLAME, value)
    }

    /// Follower count is not clamped to the currency ceiling; the domain
    /// truncates it with its own cap chosen by the caller.
    pub fn set_follower_count(&mut self, value: i64) -> bool {
        self.set_scalar(SNS_INFO, FOLLOW_COUNT, value)
    }

    fn scalar(&self, section: &str, field: &str) -> i64 {
        if !self.loaded {
            return 0;
        }
        self.document.get_int(section, field)
    }

    fn set_currency(&mut self, section: &str, field: &str, value: i64) -> bool {
        self.set_scalar(section, field, value.min(MAX_CURRENCY))
    }

    fn set_scalar(&mut self, section: &str, field: &str, value: i64) -> bool {
        if !self.loaded {
            warn!("attempted to set {section}.{field} with no save loaded");
            return false;
        }
        let ok = self.document.set_int(section, field, value);
        if ok {
            info!("{section}.{field} set to {value}");
        }
        ok
    }

    // ========================================================================
    // Staff roster
    // ========================================================================

    /// Set every hired staff member's level to [`STAFF_MAX_LEVEL`],
    /// leaving the player character untouched.
    pub fn max_staff_levels(&mut self) -> Result<PassReport, EngineError> {
        if !self.loaded {
            return Err(EngineError::NoSaveLoaded);
        }
        let mut report = PassReport::default();
        let Some(roster) = self.document.section_mut(STAFF) else {
            report.warn(format!("'{STAFF}' section not found; no staff to level"));
            return Ok(report);
        };

        for (key, entry) in roster.iter_mut() {
            let Some(record) = entry.as_object_mut() else {
                report.warn(format!("staff entry '{key}' is malformed; skipping"));
                continue;
            };
            if record.get(STAFF_NAME).and_then(Value::as_str) == Some(PLAYER_STAFF_NAME) {
                report.skipped += 1;
                continue;
            }
            record.insert(STAFF_LEVEL.to_string(), Value::from(STAFF_MAX_LEVEL));
            report.updated += 1;
        }

        info!(
            "staff levels: updated {}, skipped {}",
            report.updated, report.skipped
        );
        Ok(report)
    }
}
