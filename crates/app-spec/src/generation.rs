//! Prompt contract and response cleaning for AI-drafted documents.
//!
//! The generator may answer with two extra top-level keys, `isComplex` and
//! `sourceCode`, when a request does not fit the section model. They are
//! lifted out here and never reach the stored [`Document`].

use schemars::schema_for;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{SchemaError, validate_document};
use crate::spec::{Document, FieldType, SECTION_TYPES};

pub const IS_COMPLEX_KEY: &str = "isComplex";
pub const SOURCE_CODE_KEY: &str = "sourceCode";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("describe the app you want to generate")]
    EmptyInput,
    #[error("generator failed: {0}")]
    Collaborator(String),
    #[error("malformed output: {0}")]
    MalformedOutput(String),
    #[error("malformed output: expected a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A validated draft plus the generator's escape-hatch metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedApp {
    pub document: Document,
    pub is_complex: bool,
    pub source_code: Option<String>,
}

/// Fixed instructions followed by the operator's request.
pub fn build_prompt(request: &str) -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(Document)).unwrap_or_default();
    format!(
        "You design small interactive web apps as a single JSON document.\n\
         Respond with JSON only, no commentary.\n\
         \n\
         Document rules:\n\
         - meta.title, meta.slug and meta.description are required and non-empty; \
         slug is lowercase words joined by '-'.\n\
         - sections is an ordered array; each section has a \"type\" of: {sections}.\n\
         - field types: {fields}. select and radio fields need \"options\".\n\
         - field names use lowercase letters, digits and underscores; they are the \
         variables of formulas and the keys of submitted values.\n\
         - calculator.formula is an arithmetic expression over input names \
         (+ - * / % **, comparisons, && ||, cond ? a : b, min max abs round floor ceil sqrt pow).\n\
         - calculator.resultFormat and result.template use {{{{name}}}} placeholders; \
         {{{{result}}}} is the latest calculator output.\n\
         - result.showIf is a boolean expression over field names.\n\
         - crm.fieldMap maps field names to contact attributes \
         (firstName, lastName, email, phone).\n\
         \n\
         If the request cannot be expressed with these sections, set \"{complex}\": true \
         and put a self-contained implementation in \"{source}\", still filling meta and \
         sections with the closest approximation.\n\
         \n\
         JSON Schema:\n{schema}\n\
         \n\
         Request:\n{request}\n",
        sections = SECTION_TYPES.join(", "),
        fields = FieldType::KNOWN.join(", "),
        complex = IS_COMPLEX_KEY,
        source = SOURCE_CODE_KEY,
        schema = schema,
        request = request.trim(),
    )
}

/// Remove one surrounding markdown code fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((info, body)) if info.trim().chars().all(|ch| ch.is_ascii_alphanumeric()) => body,
        Some(_) => rest,
        None => rest.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Clean, parse, and validate a raw generator response.
pub fn parse_generated(raw: &str) -> Result<GeneratedApp, GenerationError> {
    let cleaned = strip_code_fence(raw);
    let mut value: Value = serde_json::from_str(cleaned)
        .map_err(|err| GenerationError::MalformedOutput(err.to_string()))?;
    let object = value.as_object_mut().ok_or(GenerationError::NotAnObject)?;

    let is_complex = object
        .remove(IS_COMPLEX_KEY)
        .and_then(|flag| flag.as_bool())
        .unwrap_or(false);
    let source_code = object
        .remove(SOURCE_CODE_KEY)
        .and_then(|code| code.as_str().map(str::to_string))
        .filter(|code| !code.trim().is_empty());

    let document = validate_document(&value)?;
    Ok(GeneratedApp {
        document,
        is_complex,
        source_code,
    })
}
