use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CoreError;

/// The decoded save file: an order-preserving tree of named sections,
/// each mapping string keys to dynamically-typed records.
///
/// The section set is whatever the source file contained. Nothing here
/// assumes a section exists: reads degrade to defaults and writes to
/// missing sections are warn-logged no-ops, so a partially-shaped or
/// unloaded document never causes a crash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveDocument {
    sections: Map<String, Value>,
}

impl SaveDocument {
    /// Parse decoded save text. The top level must be a JSON object.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// Serialize back to compact text (no pretty printing, matching the
    /// on-disk format).
    pub fn to_text(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialize(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.get(name).is_some_and(Value::is_object)
    }

    /// A section's keyed records, if the section exists and is a mapping.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.sections.get(name).and_then(Value::as_object)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Map<String, Value>> {
        self.sections.get_mut(name).and_then(Value::as_object_mut)
    }

    /// Get or create a section as an empty keyed collection.
    ///
    /// This is the one sanctioned exception to the no-create rule; only
    /// the normalize-all reconciliation pass uses it. A present but
    /// non-mapping value is replaced, since nothing else can be done
    /// with it.
    pub fn ensure_section(&mut self, name: &str) -> &mut Map<String, Value> {
        let slot = self
            .sections
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            warn!("section '{name}' is not a mapping; replacing with an empty one");
            *slot = Value::Object(Map::new());
        }
        slot.as_object_mut().expect("just ensured an object")
    }

    /// Read an integer field, defaulting to 0 when the section or field
    /// is absent or of the wrong type. The caller always gets a
    /// displayable value.
    pub fn get_int(&self, section: &str, field: &str) -> i64 {
        self.section(section)
            .and_then(|s| s.get(field))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Write an integer field. Returns false (after a logged warning)
    /// when the owning section is missing; top-level sections are never
    /// created here.
    pub fn set_int(&mut self, section: &str, field: &str, value: i64) -> bool {
        match self.section_mut(section) {
            Some(records) => {
                records.insert(field.to_string(), Value::from(value));
                true
            }
            None => {
                warn!("cannot set {section}.{field}: section not found or invalid");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_requires_object_root() {
        assert!(SaveDocument::parse("[1, 2, 3]").is_err());
        assert!(SaveDocument::parse("not json").is_err());
        assert!(SaveDocument::parse("{}").is_ok());
    }

    #[test]
    fn reparse_is_field_for_field_equal() {
        let doc = SaveDocument::parse(
            r#"{"PlayerInfo":{"m_Gold":5,"m_Bei":0},"Staff":{"1":{"name":"a","level":3}}}"#,
        )
        .unwrap();
        let text = doc.to_text().unwrap();
        let reparsed = SaveDocument::parse(&text).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn get_int_defaults_to_zero() {
        let doc = SaveDocument::parse(r#"{"PlayerInfo":{"m_Gold":"not a number"}}"#).unwrap();
        assert_eq!(doc.get_int("PlayerInfo", "m_Gold"), 0);
        assert_eq!(doc.get_int("PlayerInfo", "m_Bei"), 0);
        assert_eq!(doc.get_int("Missing", "m_Gold"), 0);
    }

    #[test]
    fn set_int_refuses_missing_section() {
        let mut doc = SaveDocument::parse(r#"{"PlayerInfo":{}}"#).unwrap();
        assert!(doc.set_int("PlayerInfo", "m_Gold", 7));
        assert_eq!(doc.get_int("PlayerInfo", "m_Gold"), 7);

        assert!(!doc.set_int("SNSInfo", "m_Follow_Count", 7));
        assert!(!doc.has_section("SNSInfo"));
    }

    #[test]
    fn ensure_section_creates_once() {
        let mut doc = SaveDocument::default();
        doc.ensure_section("Ingredients")
            .insert("101".into(), Value::from(1));
        assert!(doc.has_section("Ingredients"));
        assert_eq!(doc.ensure_section("Ingredients").len(), 1);
    }

    #[test]
    fn ensure_section_replaces_non_mapping() {
        let mut doc = SaveDocument::parse(r#"{"Ingredients":42}"#).unwrap();
        assert!(doc.ensure_section("Ingredients").is_empty());
    }
}
