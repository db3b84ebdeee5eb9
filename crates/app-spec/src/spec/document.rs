use std::collections::BTreeSet;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::Field;
use crate::spec::section::Section;

/// Identity and listing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Meta {
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Outbound contact mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrmConfig {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Submitted field name to contact attribute, in authoring order.
    #[serde(default)]
    pub field_map: IndexMap<String, String>,
}

/// Page chrome options passed through to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub show_header: bool,
    #[serde(default = "default_true")]
    pub show_footer: bool,
    #[serde(default = "default_submit_text")]
    pub submit_button_text: String,
    #[serde(default = "default_success_message")]
    pub success_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_submit_text() -> String {
    "Submit".to_string()
}

fn default_success_message() -> String {
    "Thanks! We'll be in touch.".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_header: true,
            show_footer: true,
            submit_button_text: default_submit_text(),
            success_message: default_success_message(),
            redirect_url: None,
        }
    }
}

/// Top-level app definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub meta: Meta,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm: Option<CrmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl Document {
    pub fn slug(&self) -> &str {
        &self.meta.slug
    }

    /// Every field of every section, in document order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(Section::fields)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|field| field.name == name)
    }

    pub fn settings_or_default(&self) -> Settings {
        self.settings.clone().unwrap_or_default()
    }
}
