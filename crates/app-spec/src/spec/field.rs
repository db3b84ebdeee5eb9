use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Input kinds a field can capture.
///
/// Unknown kinds are kept verbatim in [`FieldType::Other`] so documents written
/// by newer authoring tools still load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Phone,
    Number,
    Select,
    Textarea,
    Checkbox,
    Radio,
    Hidden,
    Other(String),
}

impl FieldType {
    pub const KNOWN: [&'static str; 9] = [
        "text", "email", "phone", "number", "select", "textarea", "checkbox", "radio", "hidden",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Hidden => "hidden",
            FieldType::Other(label) => label,
        }
    }

    /// Kinds whose values are free text and subject to `pattern`.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Textarea
                | FieldType::Hidden
        )
    }

    /// Kinds that must declare options.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "phone" | "tel" => FieldType::Phone,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "textarea" => FieldType::Textarea,
            "checkbox" => FieldType::Checkbox,
            "radio" => FieldType::Radio,
            "hidden" => FieldType::Hidden,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A select/radio choice, either a bare string or a label/value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldOption {
    Plain(String),
    Labeled { label: String, value: String },
}

impl FieldOption {
    pub fn value(&self) -> &str {
        match self {
            FieldOption::Plain(value) => value,
            FieldOption::Labeled { value, .. } => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldOption::Plain(value) => value,
            FieldOption::Labeled { label, .. } => label,
        }
    }

    /// Scalars become plain options; objects need at least a `value`.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let value = map.get("value").and_then(scalar_text)?;
                let label = map
                    .get("label")
                    .and_then(scalar_text)
                    .unwrap_or_else(|| value.clone());
                Some(FieldOption::Labeled { label, value })
            }
            other => scalar_text(other).map(FieldOption::Plain),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}

// Field attributes are never a reason to reject a document: a value of the
// wrong shape reads as if the attribute were absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|number| number.is_finite()))
}

fn lenient_options<'de, D>(deserializer: D) -> Result<Vec<FieldOption>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries.iter().filter_map(FieldOption::from_json).collect(),
        _ => Vec::new(),
    })
}

/// Constraints checked when a value is captured or submitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldValidation {
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One captured input. `name` is both the formula variable and the submission key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub label: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    #[schemars(with = "String")]
    pub kind: FieldType,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub required: bool,
    #[serde(
        default,
        deserialize_with = "lenient_options",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    /// Authoring-tool hints the engine does not interpret.
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|option| FieldOption::Plain(option.into()))
            .collect();
        self
    }

    /// Whether `name` can be used as a formula variable.
    pub fn has_valid_name(&self) -> bool {
        is_identifier(&self.name)
    }
}

/// Field names are lowercase letters, digits and underscores.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_field_type_survives_round_trip() {
        let field: Field = serde_json::from_value(json!({
            "name": "when",
            "label": "When",
            "type": "date",
            "x-widget": "calendar"
        }))
        .expect("field");
        assert_eq!(field.kind, FieldType::Other("date".into()));
        assert_eq!(field.extra["x-widget"], "calendar");

        let back = serde_json::to_value(&field).expect("serialize");
        assert_eq!(back["type"], "date");
        assert_eq!(back["x-widget"], "calendar");
    }

    #[test]
    fn options_accept_strings_and_pairs() {
        let field: Field = serde_json::from_value(json!({
            "name": "plan",
            "label": "Plan",
            "type": "select",
            "options": ["basic", {"label": "Pro plan", "value": "pro"}]
        }))
        .expect("field");
        let values: Vec<_> = field.options.iter().map(FieldOption::value).collect();
        assert_eq!(values, vec!["basic", "pro"]);
        assert_eq!(field.options[1].label(), "Pro plan");
    }

    #[test]
    fn mistyped_attributes_read_as_absent() {
        let field: Field = serde_json::from_value(json!({
            "name": "qty",
            "label": null,
            "type": 3,
            "placeholder": ["x"],
            "required": "true",
            "options": [1, true, {"value": 2}, {"label": "no value"}, null],
            "validation": { "min": "1", "max": "ten", "pattern": 7 }
        }))
        .expect("field");
        assert_eq!(field.label, "");
        assert_eq!(field.kind, FieldType::Text);
        assert_eq!(field.placeholder, None);
        assert!(field.required);
        let values: Vec<_> = field.options.iter().map(FieldOption::value).collect();
        assert_eq!(values, vec!["1", "true", "2"]);
        assert_eq!(
            field.validation,
            Some(FieldValidation {
                min: Some(1.0),
                ..FieldValidation::default()
            })
        );
    }

    #[test]
    fn identifiers_are_lowercase_snake() {
        assert!(is_identifier("first_name2"));
        assert!(!is_identifier("FirstName"));
        assert!(!is_identifier("first-name"));
        assert!(!is_identifier(""));
    }
}
