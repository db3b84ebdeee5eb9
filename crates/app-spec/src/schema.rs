//! Structural acceptance of raw JSON into a [`Document`].
//!
//! Only the document skeleton is checked: `meta` and its three required
//! strings, the `sections` array, and each section's `type` tag. Field objects
//! are deliberately not deep-validated, so authoring tools may attach extra
//! hints and older documents with missing optional attributes keep loading.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::spec::{Document, Field, SECTION_TYPES, Section};

/// Authoring error found before any evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("meta required")]
    MissingMeta,
    #[error("meta.{0} required")]
    MissingMetaField(&'static str),
    #[error("sections must be an array")]
    SectionsNotArray,
    #[error("invalid section type {found} at sections[{index}] (expected one of text, form, calculator, wizard, result)")]
    InvalidSectionType { index: usize, found: String },
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Validate `raw` and convert it into a typed document.
pub fn validate_document(raw: &Value) -> Result<Document, SchemaError> {
    let root = raw.as_object().ok_or(SchemaError::MissingMeta)?;
    check_meta(root)?;

    let sections = root
        .get("sections")
        .and_then(Value::as_array)
        .ok_or(SchemaError::SectionsNotArray)?;
    for (index, section) in sections.iter().enumerate() {
        let tag = section.get("type").and_then(Value::as_str);
        match tag {
            Some(kind) if SECTION_TYPES.contains(&kind) => {}
            _ => {
                return Err(SchemaError::InvalidSectionType {
                    index,
                    found: describe_tag(section.get("type")),
                });
            }
        }
    }

    serde_json::from_value(raw.clone()).map_err(|err| {
        SchemaError::Malformed(locate_failure(sections).unwrap_or_else(|| err.to_string()))
    })
}

/// Parse text and validate it in one go.
pub fn parse_document(text: &str) -> Result<Document, SchemaError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|err| SchemaError::Malformed(err.to_string()))?;
    validate_document(&raw)
}

fn check_meta(root: &Map<String, Value>) -> Result<(), SchemaError> {
    let meta = root
        .get("meta")
        .and_then(Value::as_object)
        .ok_or(SchemaError::MissingMeta)?;
    for key in ["title", "slug", "description"] {
        let present = meta
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            return Err(SchemaError::MissingMetaField(key));
        }
    }
    Ok(())
}

/// Point at the first section or field entry that does not deserialize.
fn locate_failure(sections: &[Value]) -> Option<String> {
    sections.iter().enumerate().find_map(|(index, section)| {
        let base = format!("sections[{index}]");
        field_lists(section)
            .into_iter()
            .find_map(|(path, entries)| {
                entries.iter().enumerate().find_map(|(position, entry)| {
                    serde_json::from_value::<Field>(entry.clone())
                        .err()
                        .map(|err| format!("{base}.{path}[{position}]: {err}"))
                })
            })
            .or_else(|| {
                serde_json::from_value::<Section>(section.clone())
                    .err()
                    .map(|err| format!("{base}: {err}"))
            })
    })
}

fn field_lists(section: &Value) -> Vec<(String, &Vec<Value>)> {
    let mut lists = Vec::new();
    for key in ["fields", "inputs"] {
        if let Some(entries) = section.get(key).and_then(Value::as_array) {
            lists.push((key.to_string(), entries));
        }
    }
    if let Some(steps) = section.get("steps").and_then(Value::as_array) {
        for (step, value) in steps.iter().enumerate() {
            if let Some(entries) = value.get("fields").and_then(Value::as_array) {
                lists.push((format!("steps[{step}].fields"), entries));
            }
        }
    }
    lists
}

fn describe_tag(tag: Option<&Value>) -> String {
    match tag {
        None | Some(Value::Null) => "<missing>".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
