use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::Scalar;
use crate::spec::{Field, FieldType};
use crate::values::{Values, is_blank, value_to_display};

/// A constraint failure scoped to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Outcome of checking a set of fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub missing_required: Vec<String>,
}

impl ValidationResult {
    pub fn failing_fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }
}

/// Check every field against `values`, collecting all failures.
pub fn validate_fields<'a, I>(fields: I, values: &Values) -> ValidationResult
where
    I: IntoIterator<Item = &'a Field>,
{
    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in fields {
        if let Some(error) = validate_value(field, values.get(&field.name)) {
            if error.code == "required" {
                missing_required.push(field.name.clone());
            }
            errors.push(error);
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        missing_required,
    }
}

/// Check a single captured value. Returns the first failing constraint.
pub fn validate_value(field: &Field, value: Option<&Value>) -> Option<FieldError> {
    if matches!(field.kind, FieldType::Checkbox) {
        let checked = value.is_some_and(|value| Scalar::from_json(value).truthy());
        if field.required && !checked {
            return Some(field_error(field, "required"));
        }
        return None;
    }

    if is_blank(value) {
        return field.required.then(|| field_error(field, "required"));
    }
    let value = value?;
    let validation = field.validation.clone().unwrap_or_default();

    match &field.kind {
        FieldType::Number => {
            let number = Scalar::from_json(value).as_number();
            let Some(number) = number.filter(|number| number.is_finite()) else {
                return Some(field_error(field, "not_a_number"));
            };
            if validation.min.is_some_and(|min| number < min) {
                return Some(field_error(field, "min"));
            }
            if validation.max.is_some_and(|max| number > max) {
                return Some(field_error(field, "max"));
            }
        }
        kind if kind.has_options() => {
            let text = value_to_display(value);
            if !field.options.is_empty()
                && !field.options.iter().any(|option| option.value() == text)
            {
                return Some(field_error(field, "invalid_option"));
            }
        }
        kind if kind.is_text_like() => {
            let text = value_to_display(value);
            if matches!(kind, FieldType::Email) && !email_pattern().is_match(text.trim()) {
                return Some(field_error(field, "invalid_email"));
            }
            if let Some(pattern) = &validation.pattern
                && let Ok(regex) = Regex::new(&format!("^(?:{pattern})$"))
                && !regex.is_match(&text)
            {
                return Some(field_error(field, "pattern_mismatch"));
            }
        }
        _ => {}
    }

    None
}

fn field_error(field: &Field, code: &str) -> FieldError {
    let message = field
        .validation
        .as_ref()
        .and_then(|validation| validation.message.clone())
        .unwrap_or_else(|| default_message(field, code));
    FieldError {
        field: field.name.clone(),
        message,
        code: code.to_string(),
    }
}

fn default_message(field: &Field, code: &str) -> String {
    let label = if field.label.is_empty() {
        field.name.as_str()
    } else {
        field.label.as_str()
    };
    let bounds = field.validation.as_ref();
    match code {
        "required" => format!("{label} is required"),
        "not_a_number" => format!("{label} must be a number"),
        "min" => format!(
            "{label} must be at least {}",
            bounds.and_then(|v| v.min).map(crate::values::format_number).unwrap_or_default()
        ),
        "max" => format!(
            "{label} must be at most {}",
            bounds.and_then(|v| v.max).map(crate::values::format_number).unwrap_or_default()
        ),
        "invalid_email" => format!("{label} must be a valid email address"),
        "invalid_option" => format!("{label} must be one of the listed options"),
        _ => format!("{label} is invalid"),
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldValidation;
    use serde_json::json;

    fn values(value: Value) -> Values {
        serde_json::from_value(value).expect("values")
    }

    #[test]
    fn lists_every_failing_field() {
        let fields = vec![
            Field::new("name", "Name", FieldType::Text).required(),
            Field::new("email", "Email", FieldType::Email).required(),
            Field::new("age", "Age", FieldType::Number).with_validation(FieldValidation {
                min: Some(18.0),
                ..Default::default()
            }),
        ];
        let result = validate_fields(&fields, &values(json!({ "email": "nope", "age": "12" })));
        assert!(!result.valid);
        assert_eq!(result.failing_fields(), vec!["name", "email", "age"]);
        assert_eq!(result.missing_required, vec!["name"]);
        assert_eq!(result.errors[2].message, "Age must be at least 18");
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let field = Field::new("qty", "Quantity", FieldType::Number)
            .required()
            .with_validation(FieldValidation {
                min: Some(1.0),
                max: Some(10.0),
                ..Default::default()
            });
        for text in ["NaN", "nan", "inf", "-Infinity"] {
            let error = validate_value(&field, Some(&json!(text))).expect("error");
            assert_eq!(error.code, "not_a_number", "{text}");
        }
        assert!(validate_value(&field, Some(&json!("4"))).is_none());
    }

    #[test]
    fn custom_message_wins() {
        let field = Field::new("zip", "ZIP", FieldType::Text).with_validation(FieldValidation {
            pattern: Some("[0-9]{5}".into()),
            message: Some("Enter a 5 digit ZIP".into()),
            ..Default::default()
        });
        let error = validate_value(&field, Some(&json!("1234a"))).expect("error");
        assert_eq!(error.code, "pattern_mismatch");
        assert_eq!(error.message, "Enter a 5 digit ZIP");
        assert!(validate_value(&field, Some(&json!("12345"))).is_none());
        // pattern must match the whole value
        assert!(validate_value(&field, Some(&json!("123456"))).is_some());
    }

    #[test]
    fn optional_blank_values_pass() {
        let field = Field::new("age", "Age", FieldType::Number).with_validation(FieldValidation {
            min: Some(1.0),
            ..Default::default()
        });
        assert!(validate_value(&field, None).is_none());
        assert!(validate_value(&field, Some(&json!(""))).is_none());
    }

    #[test]
    fn number_bounds_and_parse() {
        let field = Field::new("qty", "Quantity", FieldType::Number).with_validation(
            FieldValidation {
                min: Some(1.0),
                max: Some(10.0),
                ..Default::default()
            },
        );
        assert_eq!(
            validate_value(&field, Some(&json!("abc"))).map(|e| e.code),
            Some("not_a_number".into())
        );
        assert_eq!(
            validate_value(&field, Some(&json!(11))).map(|e| e.code),
            Some("max".into())
        );
        assert!(validate_value(&field, Some(&json!("10"))).is_none());
    }

    #[test]
    fn options_and_checkbox() {
        let plan = Field::new("plan", "Plan", FieldType::Select).with_options(["basic", "pro"]);
        assert!(validate_value(&plan, Some(&json!("pro"))).is_none());
        assert_eq!(
            validate_value(&plan, Some(&json!("gold"))).map(|e| e.code),
            Some("invalid_option".into())
        );

        let consent = Field::new("consent", "Consent", FieldType::Checkbox).required();
        assert!(validate_value(&consent, Some(&json!(true))).is_none());
        assert!(validate_value(&consent, Some(&json!("on"))).is_none());
        assert!(validate_value(&consent, Some(&json!("false"))).is_some());
        assert!(validate_value(&consent, None).is_some());
    }

    #[test]
    fn invalid_pattern_is_ignored() {
        let field = Field::new("code", "Code", FieldType::Text).with_validation(FieldValidation {
            pattern: Some("([".into()),
            ..Default::default()
        });
        assert!(validate_value(&field, Some(&json!("anything"))).is_none());
    }
}
