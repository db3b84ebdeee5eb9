use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::Document;

/// Submitted values keyed by field name.
pub type Values = BTreeMap<String, Value>;

/// Named values visible to formulas, guards and templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    values: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &Values) -> Self {
        Self {
            values: values.clone(),
        }
    }

    /// Build from a JSON object; anything else yields an empty environment.
    pub fn from_json(value: &Value) -> Self {
        let values = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    /// Field defaults from `document`, overlaid with `values`.
    pub fn for_document(document: &Document, values: &Values) -> Self {
        let mut env = Self::new();
        for field in document.fields() {
            if let Some(default) = &field.default_value
                && !field.name.is_empty()
            {
                env.values.insert(field.name.clone(), default.clone());
            }
        }
        for (name, value) in values {
            env.values.insert(name.clone(), value.clone());
        }
        env
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Bind a computed number, keeping whole numbers integral for display.
    pub fn bind_number(&mut self, name: impl Into<String>, number: f64) {
        self.values.insert(name.into(), number_value(number));
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<_, _>>(),
        )
    }
}

/// JSON number for `number`; whole values become integers so they print without `.0`.
pub fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        Value::from(number as i64)
    } else {
        serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Display form of a number: `40` rather than `40.0`.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// String form of a captured value as templates and contacts see it.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    }
}

/// A value counts as answered when it is present and not blank.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_print_without_fraction() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(number_value(40.0), json!(40));
        assert_eq!(value_to_display(&json!(12.0)), "12");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!("  "))));
        assert!(is_blank(Some(&Value::Null)));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(false))));
    }

    #[test]
    fn document_defaults_are_overridden_by_values() {
        let document: Document = serde_json::from_value(json!({
            "meta": { "title": "T", "slug": "t", "description": "d" },
            "sections": [{
                "type": "calculator",
                "inputs": [
                    { "name": "rate", "label": "Rate", "type": "number", "defaultValue": 5 },
                    { "name": "hours", "label": "Hours", "type": "number", "defaultValue": 1 }
                ],
                "formula": "rate * hours",
                "resultLabel": "Total"
            }]
        }))
        .expect("document");
        let values = Values::from([("hours".to_string(), json!("8"))]);
        let env = Environment::for_document(&document, &values);
        assert_eq!(env.get("rate"), Some(&json!(5)));
        assert_eq!(env.get("hours"), Some(&json!("8")));
    }
}
