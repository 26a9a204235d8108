//! Inventory reconciliation passes.
//!
//! Each pass folds over a save-document section against the reference
//! catalog and rewrites stack counts to their tier-normalized targets.
//! Passes never abort on a bad entry: it is logged and counted as
//! skipped, so one malformed record can't block the rest of the save.

use log::{info, warn};
use serde_json::{Value, json, map::Entry};

use tidesave_core::tiers;
use tidesave_refdata::{RefDataError, RefDataset};

use crate::{EngineError, INGREDIENTS, MATERIALS, SaveEngine};

const INGREDIENT_ID: &str = "ingredientsID";
const INGREDIENT_COUNT: &str = "count";
const ITEM_ID: &str = "itemID";
const ITEM_COUNT: &str = "totalCount";
const LEVEL: &str = "level";
const PARENT_ID: &str = "parentID";
const BRANCH_COUNT: &str = "branchCount";
const LAST_GAIN_TIME: &str = "lastGainTime";
const LAST_GAIN_GAME_TIME: &str = "lastGainGameTime";
const IS_NEW: &str = "isNew";
const PLACE_TAG_MASK: &str = "placeTagMask";

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Entries whose count was rewritten.
    pub updated: usize,
    /// Entries synthesized from the catalog.
    pub added: usize,
    /// Entries left untouched (capacity-1 tier, unknown id, malformed).
    pub skipped: usize,
    /// Human-readable notes for everything that was skipped abnormally.
    pub warnings: Vec<String>,
}

impl PassReport {
    pub(crate) fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Timestamp literals used for synthesized entries when the save holds
/// no existing entry to inherit them from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthDefaults {
    pub last_gain_time: String,
    pub last_gain_game_time: String,
}

impl Default for SynthDefaults {
    fn default() -> Self {
        Self {
            last_gain_time: "04/01/2025 12:34:56".to_string(),
            last_gain_game_time: "10/03/2022 08:30:52".to_string(),
        }
    }
}

impl SaveEngine {
    /// Rewrite every owned ingredient's stack count to its capacity
    /// tier's target.
    pub fn max_owned_ingredients(
        &mut self,
        dataset: &RefDataset,
    ) -> Result<PassReport, EngineError> {
        self.normalize_owned(INGREDIENTS, INGREDIENT_ID, INGREDIENT_COUNT, |id| {
            dataset.ingredient_capacity(id)
        })
    }

    /// Rewrite every owned material's stack count to its capacity
    /// tier's target.
    pub fn max_owned_materials(
        &mut self,
        dataset: &RefDataset,
    ) -> Result<PassReport, EngineError> {
        self.normalize_owned(MATERIALS, ITEM_ID, ITEM_COUNT, |id| {
            dataset.item_capacity(id)
        })
    }

    /// Fold a section's entries against a capacity lookup, rewriting
    /// each entry's count field in place.
    fn normalize_owned(
        &mut self,
        section: &str,
        id_field: &str,
        count_field: &str,
        capacity_of: impl Fn(i64) -> Result<Option<i64>, RefDataError>,
    ) -> Result<PassReport, EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NoSaveLoaded);
        }
        let mut report = PassReport::default();
        let Some(entries) = self.document_mut().section_mut(section) else {
            report.warn(format!("'{section}' section not found; nothing to normalize"));
            return Ok(report);
        };

        for (key, entry) in entries.iter_mut() {
            let Some(record) = entry.as_object_mut() else {
                report.warn(format!("entry '{key}' in '{section}' is malformed; skipping"));
                report.skipped += 1;
                continue;
            };
            let Some(id) = record.get(id_field).and_then(Value::as_i64) else {
                report.warn(format!("entry '{key}' in '{section}' has no usable {id_field}"));
                report.skipped += 1;
                continue;
            };
            let capacity = match capacity_of(id) {
                Ok(Some(capacity)) => capacity,
                Ok(None) => {
                    report.warn(format!("{id_field} {id} not found in the reference catalog"));
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    report.warn(format!("capacity lookup for {id_field} {id} failed: {e}"));
                    report.skipped += 1;
                    continue;
                }
            };
            let desired = tiers::desired_count(capacity);
            if desired == tiers::SKIP {
                report.skipped += 1;
                continue;
            }
            record.insert(count_field.to_string(), Value::from(desired));
            report.updated += 1;
        }

        info!(
            "'{section}' normalized: updated {}, skipped {}",
            report.updated, report.skipped
        );
        Ok(report)
    }

    /// Reconcile the ingredient section against the full catalog:
    /// existing entries get their counts rewritten, ingredients the save
    /// has never seen are synthesized at level 1.
    ///
    /// The section is created when absent, since synthesizing into an
    /// empty save is the whole point of this pass. Synthesized entries
    /// inherit their timestamps from the section's first entry, falling
    /// back to `defaults` field by field.
    pub fn max_all_ingredients(
        &mut self,
        dataset: &RefDataset,
        defaults: &SynthDefaults,
    ) -> Result<PassReport, EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NoSaveLoaded);
        }
        let catalog = dataset.all_ingredients()?;
        let mut report = PassReport::default();
        let entries = self.document_mut().ensure_section(INGREDIENTS);

        let (last_gain_time, last_gain_game_time) = inherited_timestamps(entries, defaults);

        for ingredient in &catalog {
            let desired = tiers::desired_count(ingredient.max_count);
            if desired == tiers::SKIP {
                report.skipped += 1;
                continue;
            }
            let key = ingredient.ingredient_id.to_string();
            match entries.entry(key) {
                Entry::Occupied(mut slot) => match slot.get_mut().as_object_mut() {
                    Some(record) => {
                        record.insert(INGREDIENT_COUNT.to_string(), Value::from(desired));
                        report.updated += 1;
                    }
                    None => {
                        report.warn(format!(
                            "ingredient entry '{}' is malformed; skipping",
                            slot.key()
                        ));
                        report.skipped += 1;
                    }
                },
                Entry::Vacant(slot) => {
                    slot.insert(json!({
                        INGREDIENT_ID: ingredient.ingredient_id,
                        LEVEL: 1,
                        PARENT_ID: ingredient.parent_id,
                        INGREDIENT_COUNT: desired,
                        BRANCH_COUNT: 0,
                        LAST_GAIN_TIME: &last_gain_time,
                        LAST_GAIN_GAME_TIME: &last_gain_game_time,
                        IS_NEW: true,
                        PLACE_TAG_MASK: 1,
                    }));
                    report.added += 1;
                }
            }
        }

        info!(
            "full ingredient reconcile: updated {}, added {}, skipped {}",
            report.updated, report.added, report.skipped
        );
        Ok(report)
    }
}

/// Timestamps for synthesized entries, taken from the section's first
/// entry. Each field falls back independently; a first entry that is
/// not an object contributes nothing, even if a later entry carries
/// timestamps.
fn inherited_timestamps(
    entries: &serde_json::Map<String, Value>,
    defaults: &SynthDefaults,
) -> (String, String) {
    let first = entries.values().next().and_then(Value::as_object);
    let pick = |field: &str, fallback: &str| {
        first
            .and_then(|record| record.get(field))
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    (
        pick(LAST_GAIN_TIME, &defaults.last_gain_time),
        pick(LAST_GAIN_GAME_TIME, &defaults.last_gain_game_time),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidesave_core::SaveDocument;

    fn engine_with(text: &str) -> SaveEngine {
        SaveEngine {
            document: SaveDocument::parse(text).unwrap(),
            source_path: None,
            loaded: true,
        }
    }

    fn test_dataset() -> RefDataset {
        RefDataset::from_sql(
            "CREATE TABLE Items (TID INTEGER, ItemDataID INTEGER, Name TEXT, MaxCount INTEGER);
             CREATE TABLE Ingredients (TID INTEGER, Grade INTEGER);
             INSERT INTO Items VALUES (30001, 101, 'Kelp', 999);
             INSERT INTO Items VALUES (30002, 102, 'Rice', 99);
             INSERT INTO Items VALUES (30003, 103, 'Blueprint', 1);
             INSERT INTO Items VALUES (30004, 104, 'Salt', 99999);
             INSERT INTO Items VALUES (40001, 201, 'Plank', 999);
             INSERT INTO Ingredients VALUES (101, 1);
             INSERT INTO Ingredients VALUES (102, 1);
             INSERT INTO Ingredients VALUES (103, 2);
             INSERT INTO Ingredients VALUES (104, 3);",
        )
        .unwrap()
    }

    #[test]
    fn owned_ingredients_rewritten_by_tier() {
        let mut engine = engine_with(
            r#"{"Ingredients":{
                "101":{"ingredientsID":101,"count":3},
                "102":{"ingredientsID":102,"count":1},
                "103":{"ingredientsID":103,"count":1}
            }}"#,
        );
        let report = engine.max_owned_ingredients(&test_dataset()).unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.warnings.is_empty());

        let doc = engine.document();
        assert_eq!(doc.section("Ingredients").unwrap()["101"]["count"], 666);
        assert_eq!(doc.section("Ingredients").unwrap()["102"]["count"], 66);
        // Capacity-1 entries are never touched.
        assert_eq!(doc.section("Ingredients").unwrap()["103"]["count"], 1);
    }

    #[test]
    fn owned_materials_use_item_identifiers() {
        let mut engine = engine_with(
            r#"{"InventoryItemSlot":{"0":{"itemID":40001,"totalCount":2}}}"#,
        );
        let report = engine.max_owned_materials(&test_dataset()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(
            engine.document().section("InventoryItemSlot").unwrap()["0"]["totalCount"],
            666
        );
    }

    #[test]
    fn unknown_and_malformed_entries_are_skipped_with_warnings() {
        let mut engine = engine_with(
            r#"{"Ingredients":{
                "777":{"ingredientsID":777,"count":1},
                "bad":{"count":1},
                "101":{"ingredientsID":101,"count":1}
            }}"#,
        );
        let report = engine.max_owned_ingredients(&test_dataset()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.warnings.len(), 2);
        // The bad entries are left exactly as they were.
        let section = engine.document().section("Ingredients").unwrap();
        assert_eq!(section["777"]["count"], 1);
        assert_eq!(section["bad"]["count"], 1);
    }

    #[test]
    fn lookup_failures_skip_the_entry_and_continue() {
        // Rice's capacity is a string, so its point lookup fails with a
        // conversion error while the rows around it stay readable.
        let dataset = RefDataset::from_sql(
            "CREATE TABLE Items (TID INTEGER, ItemDataID INTEGER, Name TEXT, MaxCount INTEGER);
             INSERT INTO Items VALUES (30001, 101, 'Kelp', 999);
             INSERT INTO Items VALUES (30002, 102, 'Rice', 'many');
             INSERT INTO Items VALUES (30003, 103, 'Salt', 99);",
        )
        .unwrap();
        let mut engine = engine_with(
            r#"{"Ingredients":{
                "101":{"ingredientsID":101,"count":3},
                "102":{"ingredientsID":102,"count":1},
                "103":{"ingredientsID":103,"count":1}
            }}"#,
        );
        let report = engine.max_owned_ingredients(&dataset).unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.warnings.len(), 1);

        // Entries past the failing one were still processed.
        let section = engine.document().section("Ingredients").unwrap();
        assert_eq!(section["101"]["count"], 666);
        assert_eq!(section["102"]["count"], 1);
        assert_eq!(section["103"]["count"], 66);
    }

    #[test]
    fn missing_section_is_a_warning_not_an_error() {
        let mut engine = engine_with(r#"{"PlayerInfo":{}}"#);
        let report = engine.max_owned_ingredients(&test_dataset()).unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(!engine.document().has_section("Ingredients"));
    }

    #[test]
    fn full_reconcile_synthesizes_missing_ingredients() {
        let mut engine = engine_with(
            r#"{"Ingredients":{
                "101":{"ingredientsID":101,"count":2,
                       "lastGainTime":"01/02/2024 10:00:00",
                       "lastGainGameTime":"05/06/2023 11:00:00"}
            }}"#,
        );
        let report = engine
            .max_all_ingredients(&test_dataset(), &SynthDefaults::default())
            .unwrap();
        // 101 updated; 102 and 104 synthesized; 103 is capacity 1.
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 1);

        let section = engine.document().section("Ingredients").unwrap();
        assert_eq!(section["101"]["count"], 666);

        let synth = &section["102"];
        assert_eq!(synth["ingredientsID"], 102);
        assert_eq!(synth["level"], 1);
        assert_eq!(synth["parentID"], 30002);
        assert_eq!(synth["count"], 66);
        assert_eq!(synth["branchCount"], 0);
        assert_eq!(synth["isNew"], true);
        assert_eq!(synth["placeTagMask"], 1);
        // Timestamps come from the pre-existing entry.
        assert_eq!(synth["lastGainTime"], "01/02/2024 10:00:00");
        assert_eq!(synth["lastGainGameTime"], "05/06/2023 11:00:00");

        assert_eq!(section["104"]["count"], 6666);
        assert!(!section.contains_key("103"));
    }

    #[test]
    fn full_reconcile_creates_the_section_and_uses_defaults() {
        let mut engine = engine_with(r#"{"PlayerInfo":{}}"#);
        let defaults = SynthDefaults::default();
        let report = engine
            .max_all_ingredients(&test_dataset(), &defaults)
            .unwrap();
        assert_eq!(report.added, 3);
        assert_eq!(report.updated, 0);

        let section = engine.document().section("Ingredients").unwrap();
        assert_eq!(section["101"]["lastGainTime"], defaults.last_gain_time.as_str());
        assert_eq!(
            section["101"]["lastGainGameTime"],
            defaults.last_gain_game_time.as_str()
        );
    }

    #[test]
    fn timestamps_inherit_from_the_first_entry_only() {
        // The section's first entry is not an object, so synthesized
        // entries fall back to the defaults even though a later entry
        // carries timestamps.
        let mut engine = engine_with(
            r#"{"Ingredients":{
                "junk":7,
                "101":{"ingredientsID":101,"count":2,
                       "lastGainTime":"01/02/2024 10:00:00",
                       "lastGainGameTime":"05/06/2023 11:00:00"}
            }}"#,
        );
        let defaults = SynthDefaults::default();
        let report = engine
            .max_all_ingredients(&test_dataset(), &defaults)
            .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 2);

        let section = engine.document().section("Ingredients").unwrap();
        assert_eq!(
            section["102"]["lastGainTime"],
            defaults.last_gain_time.as_str()
        );
        assert_eq!(
            section["102"]["lastGainGameTime"],
            defaults.last_gain_game_time.as_str()
        );
    }

    #[test]
    fn passes_require_a_loaded_save() {
        let mut engine = SaveEngine::new();
        let dataset = test_dataset();
        assert!(matches!(
            engine.max_owned_ingredients(&dataset),
            Err(EngineError::NoSaveLoaded)
        ));
        assert!(matches!(
            engine.max_all_ingredients(&dataset, &SynthDefaults::default()),
            Err(EngineError::NoSaveLoaded)
        ));
    }
}
