use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::Field;

/// Static content. `body` is HTML and opaque to the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TextSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: String,
}

/// A flat list of inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Inputs plus a formula recomputed whenever the inputs change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Field>,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub result_label: String,
    /// Template with `{{result}}` bound to the formula output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct WizardStep {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Ordered steps, each gated on its own required fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct WizardSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub steps: Vec<WizardStep>,
}

/// A template shown once its guard holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<String>,
}

/// One ordered unit of a document, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Section {
    Text(TextSection),
    Form(FormSection),
    Calculator(CalculatorSection),
    Wizard(WizardSection),
    Result(ResultSection),
}

/// Discriminator values accepted for `Section::type`.
pub const SECTION_TYPES: [&str; 5] = ["text", "form", "calculator", "wizard", "result"];

impl Section {
    pub fn kind(&self) -> &'static str {
        match self {
            Section::Text(_) => "text",
            Section::Form(_) => "form",
            Section::Calculator(_) => "calculator",
            Section::Wizard(_) => "wizard",
            Section::Result(_) => "result",
        }
    }

    pub fn heading(&self) -> Option<&str> {
        match self {
            Section::Text(section) => section.heading.as_deref(),
            Section::Form(section) => section.heading.as_deref(),
            Section::Calculator(section) => section.heading.as_deref(),
            Section::Wizard(section) => section.heading.as_deref(),
            Section::Result(section) => section.heading.as_deref(),
        }
    }

    /// Fields captured by this section, in display order.
    pub fn fields(&self) -> Box<dyn Iterator<Item = &Field> + '_> {
        match self {
            Section::Form(section) => Box::new(section.fields.iter()),
            Section::Calculator(section) => Box::new(section.inputs.iter()),
            Section::Wizard(section) => {
                Box::new(section.steps.iter().flat_map(|step| step.fields.iter()))
            }
            Section::Text(_) | Section::Result(_) => Box::new(std::iter::empty()),
        }
    }
}
