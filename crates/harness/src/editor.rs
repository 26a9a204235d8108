use std::fs;
use std::path::{Path, PathBuf};

use tidesave_core::{SAVE_KEY, codec};
use tidesave_engine::SaveEngine;
use tidesave_refdata::RefDataset;

/// A save editor wired to a temp directory, with fixture helpers for
/// writing obfuscated save files and reading them back.
pub struct TestEditor {
    pub engine: SaveEngine,
    pub dataset: RefDataset,
    dir: tempfile::TempDir,
}

impl TestEditor {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let _ = env_logger::builder().is_test(true).try_init();
        Ok(Self {
            engine: SaveEngine::new(),
            dataset: RefDataset::load_embedded()?,
            dir: tempfile::tempdir()?,
        })
    }

    pub fn save_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Obfuscate `text` and write it as a save file named `name`.
    pub fn write_fixture(
        &self,
        name: &str,
        text: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.dir.path().join(name);
        fs::write(&path, codec::encode(text, SAVE_KEY)?)?;
        Ok(path)
    }

    /// Write [`sample_save_text`] as a fixture and load it.
    pub fn open_sample(&mut self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.write_fixture("GameSave_00_GD.sav", &sample_save_text())?;
        self.engine.open(&path)?;
        Ok(path)
    }

    /// Read an obfuscated file back to plain document text.
    pub fn decode_file(&self, path: &Path) -> Result<String, Box<dyn std::error::Error>> {
        Ok(codec::decode(&fs::read(path)?, SAVE_KEY)?)
    }
}

/// A small but fully-shaped save document: currencies, follower count,
/// a few owned ingredients and materials, and a staff roster that
/// includes the player character.
pub fn sample_save_text() -> String {
    serde_json::json!({
        "PlayerInfo": { "m_Gold": 1200, "m_Bei": 35, "m_ChefFlame": 7 },
        "SNSInfo": { "m_Follow_Count": 150 },
        "Ingredients": {
            "101": {
                "ingredientsID": 101, "level": 2, "parentID": 30001,
                "count": 12, "branchCount": 0,
                "lastGainTime": "02/14/2025 18:03:11",
                "lastGainGameTime": "07/21/2023 09:12:40",
                "isNew": false, "placeTagMask": 1
            },
            "103": {
                "ingredientsID": 103, "level": 1, "parentID": 30003,
                "count": 4, "branchCount": 0,
                "lastGainTime": "02/15/2025 10:44:02",
                "lastGainGameTime": "07/22/2023 14:05:19",
                "isNew": false, "placeTagMask": 1
            },
            "116": {
                "ingredientsID": 116, "level": 1, "parentID": 30016,
                "count": 1, "branchCount": 0,
                "lastGainTime": "02/16/2025 20:15:33",
                "lastGainGameTime": "07/23/2023 16:40:08",
                "isNew": true, "placeTagMask": 1
            }
        },
        "InventoryItemSlot": {
            "0": { "itemID": 40001, "totalCount": 5 },
            "1": { "itemID": 40002, "totalCount": 2 },
            "2": { "itemID": 40006, "totalCount": 1 }
        },
        "Staff": {
            "0": { "name": "Staff_Dave", "level": 1 },
            "1": { "name": "Staff_Masayoshi", "level": 4 },
            "2": { "name": "Staff_Liz", "level": 11 }
        }
    })
    .to_string()
}
