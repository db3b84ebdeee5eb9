//! Authoring-time checks. Lint never rejects a document; it only reports
//! problems an operator should fix before publishing.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::expr::Expr;
use crate::runtime::RESULT_VARIABLE;
use crate::spec::{Document, Field, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCode {
    InvalidExpression,
    UndeclaredVariable,
    InvalidFieldName,
    InvalidPattern,
    MissingOptions,
    DuplicateField,
    UnmappedField,
}

impl LintCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintCode::InvalidExpression => "invalid_expression",
            LintCode::UndeclaredVariable => "undeclared_variable",
            LintCode::InvalidFieldName => "invalid_field_name",
            LintCode::InvalidPattern => "invalid_pattern",
            LintCode::MissingOptions => "missing_options",
            LintCode::DuplicateField => "duplicate_field",
            LintCode::UnmappedField => "unmapped_field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub location: String,
    pub code: LintCode,
    pub message: String,
}

pub fn lint(document: &Document) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let declared: BTreeSet<&str> = document
        .fields()
        .map(|field| field.name.as_str())
        .chain([RESULT_VARIABLE])
        .collect();

    for (index, section) in document.sections.iter().enumerate() {
        let base = format!("sections[{index}]");
        lint_fields(&base, section, &mut issues);
        match section {
            Section::Calculator(calculator) => {
                lint_expression(
                    &format!("{base}.formula"),
                    &calculator.formula,
                    &declared,
                    &mut issues,
                );
            }
            Section::Result(result) => {
                if let Some(guard) = result.show_if.as_deref().filter(|g| !g.trim().is_empty()) {
                    lint_expression(&format!("{base}.showIf"), guard, &declared, &mut issues);
                }
            }
            _ => {}
        }
    }

    if let Some(crm) = &document.crm {
        for key in crm.field_map.keys() {
            if !declared.contains(key.as_str()) {
                issues.push(LintIssue {
                    location: format!("crm.fieldMap.{key}"),
                    code: LintCode::UnmappedField,
                    message: format!("fieldMap key '{key}' does not match any field"),
                });
            }
        }
    }

    issues
}

fn lint_fields(base: &str, section: &Section, issues: &mut Vec<LintIssue>) {
    let mut seen = BTreeSet::new();
    for (position, field) in section.fields().enumerate() {
        let location = format!("{base}.fields[{position}]");
        if !field.has_valid_name() {
            issues.push(LintIssue {
                location: location.clone(),
                code: LintCode::InvalidFieldName,
                message: format!(
                    "field name '{}' must use lowercase letters, digits and underscores",
                    field.name
                ),
            });
        }
        if !seen.insert(field.name.as_str()) {
            issues.push(LintIssue {
                location: location.clone(),
                code: LintCode::DuplicateField,
                message: format!("field '{}' appears more than once", field.name),
            });
        }
        if field.kind.has_options() && field.options.is_empty() {
            issues.push(LintIssue {
                location: location.clone(),
                code: LintCode::MissingOptions,
                message: format!("{} field '{}' has no options", field.kind, field.name),
            });
        }
        lint_pattern(&location, field, issues);
    }
}

fn lint_pattern(location: &str, field: &Field, issues: &mut Vec<LintIssue>) {
    let Some(pattern) = field.validation.as_ref().and_then(|v| v.pattern.as_deref()) else {
        return;
    };
    if let Err(err) = Regex::new(pattern) {
        issues.push(LintIssue {
            location: format!("{location}.validation.pattern"),
            code: LintCode::InvalidPattern,
            message: err.to_string(),
        });
    }
}

fn lint_expression(
    location: &str,
    source: &str,
    declared: &BTreeSet<&str>,
    issues: &mut Vec<LintIssue>,
) {
    match Expr::parse(source) {
        Ok(expr) => {
            for name in expr.variables() {
                if !declared.contains(name.as_str()) {
                    issues.push(LintIssue {
                        location: location.to_string(),
                        code: LintCode::UndeclaredVariable,
                        message: format!("'{name}' is not the name of any field"),
                    });
                }
            }
        }
        Err(err) => issues.push(LintIssue {
            location: location.to_string(),
            code: LintCode::InvalidExpression,
            message: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_document;
    use serde_json::json;

    #[test]
    fn clean_document_has_no_issues() {
        let document = validate_document(&json!({
            "meta": { "title": "T", "slug": "t", "description": "d" },
            "sections": [
                {
                    "type": "calculator",
                    "inputs": [{ "name": "hours", "label": "Hours", "type": "number" }],
                    "formula": "hours * 90",
                    "resultLabel": "Cost"
                },
                { "type": "result", "template": "{{result}}", "showIf": "result > 0" }
            ],
            "crm": { "source": "web", "fieldMap": { "hours": "notes" } }
        }))
        .expect("document");
        assert!(lint(&document).is_empty());
    }

    #[test]
    fn reports_authoring_mistakes() {
        let document = validate_document(&json!({
            "meta": { "title": "T", "slug": "t", "description": "d" },
            "sections": [
                {
                    "type": "form",
                    "fields": [
                        { "name": "Email", "label": "Email", "type": "email" },
                        { "name": "plan", "label": "Plan", "type": "select" },
                        { "name": "plan", "label": "Plan again", "type": "text",
                          "validation": { "pattern": "([" } }
                    ]
                },
                {
                    "type": "calculator",
                    "inputs": [],
                    "formula": "seats * * 2",
                    "resultLabel": "x"
                },
                { "type": "result", "template": "", "showIf": "vip == true" }
            ],
            "crm": { "source": "web", "fieldMap": { "email": "email" } }
        }))
        .expect("document");

        let codes: Vec<LintCode> = lint(&document).into_iter().map(|issue| issue.code).collect();
        assert_eq!(
            codes,
            vec![
                LintCode::InvalidFieldName,
                LintCode::MissingOptions,
                LintCode::DuplicateField,
                LintCode::InvalidPattern,
                LintCode::InvalidExpression,
                LintCode::UndeclaredVariable,
                LintCode::UnmappedField,
            ]
        );
    }
}
