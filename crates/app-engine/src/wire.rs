//! Request and response bodies for the public endpoints.

use serde::{Deserialize, Serialize};
use serde_json::json;

use app_spec::{Document, FieldError, GeneratedApp, Values};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub slug: String,
    #[serde(default)]
    pub values: Values,
}

/// What a submitter sees: accepted, field errors, or a plain error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Rejected {
        accepted: bool,
        errors: Vec<FieldError>,
    },
    Accepted {
        accepted: bool,
    },
    Failed {
        error: String,
    },
}

impl SubmitResponse {
    pub fn accepted() -> Self {
        Self::Accepted { accepted: true }
    }

    pub fn rejected(errors: Vec<FieldError>) -> Self {
        Self::Rejected {
            accepted: false,
            errors,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { accepted: true })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Generated {
        definition: Document,
        #[serde(rename = "isComplex")]
        is_complex: bool,
        #[serde(
            rename = "sourceCode",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        source_code: Option<String>,
    },
    Failed {
        error: String,
    },
}

impl From<GeneratedApp> for GenerateResponse {
    fn from(app: GeneratedApp) -> Self {
        GenerateResponse::Generated {
            definition: app.document,
            is_complex: app.is_complex,
            source_code: app.source_code,
        }
    }
}

/// Serialize `value`, falling back to an `{"error"}` body.
pub fn respond<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|error| json!({ "error": format!("json encode: {}", error) }).to_string())
}

pub(crate) fn error_body(message: impl std::fmt::Display) -> String {
    json!({ "error": message.to_string() }).to_string()
}

/// Parse a request body, treating anything unparsable as an error body.
pub(crate) fn parse_request<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, String> {
    serde_json::from_str::<T>(body).map_err(|err| error_body(format!("invalid request: {err}")))
}
