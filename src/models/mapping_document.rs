//! Mapping document model.
//!
//! Users hand the tool mapping files in whatever shape they happen to have:
//!
//! ```text
//! (i)   bare mapping            { "properties": { ... }, "_meta": { ... } }
//! (ii)  GET _mapping response   { "products": { "mappings": { "properties": { ... } } } }
//! (iii) create-index body       { "mappings": { "properties": { ... } } }
//! ```
//!
//! [`MappingDocument::normalize`] reduces all three to the bare shape. It does
//! no cluster I/O and normalizing an already bare mapping returns it unchanged.

use crate::common::*;

/// Keys that may appear at the top level of a bare mapping. A single-key
/// object whose key is one of these is a bare mapping, never an envelope.
const BARE_MAPPING_KEYS: &[&str] = &[
    "properties",
    "dynamic",
    "dynamic_templates",
    "runtime",
    "date_detection",
    "numeric_detection",
    "dynamic_date_formats",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingDocument(Value);

impl MappingDocument {
    /// Strips any `{name: {mappings}}` or `{mappings}` envelope around `raw`.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` (or the unwrapped mapping) is not a JSON object.
    pub fn normalize(raw: &Value) -> Result<Self> {
        let obj: &Map<String, Value> = raw.as_object().ok_or_else(|| {
            anyhow!("[MappingDocument::normalize] mapping must be a JSON object")
        })?;

        let bare: &Value = if let Some(inner) = obj.get("mappings") {
            inner
        } else if let Some(inner) = Self::index_envelope(obj) {
            inner
        } else {
            raw
        };

        if !bare.is_object() {
            return Err(anyhow!(
                "[MappingDocument::normalize] 'mappings' must be a JSON object, got: {}",
                bare
            ));
        }

        Ok(MappingDocument(bare.clone()))
    }

    /// Matches the `{ "<index name>": { "mappings": {...} } }` envelope.
    fn index_envelope(obj: &Map<String, Value>) -> Option<&Value> {
        if obj.len() != 1 {
            return None;
        }

        let (key, value) = obj.iter().next()?;

        if key.starts_with('_') || BARE_MAPPING_KEYS.contains(&key.as_str()) {
            return None;
        }

        value.as_object()?.get("mappings")
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Field names declared under `properties`, sorted.
    pub fn field_names(&self) -> Vec<String> {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}
