use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use app_spec::values::{is_blank, value_to_display};
use app_spec::{CrmConfig, Values};

/// Outbound lead record for the contact collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub source: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactField {
    FirstName,
    LastName,
    Email,
    Phone,
}

impl ContactField {
    /// Accepts `firstName`, `first_name`, `FirstName` and friends.
    fn parse(target: &str) -> Option<Self> {
        let normalized: String = target
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "firstname" => Some(Self::FirstName),
            "lastname" => Some(Self::LastName),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }

    /// Submitted keys consulted when the mapped field is empty.
    fn fallback_keys(self) -> &'static [&'static str] {
        match self {
            Self::FirstName => &["first_name", "firstName", "name"],
            Self::LastName => &["last_name", "lastName"],
            Self::Email => &["email"],
            Self::Phone => &["phone"],
        }
    }
}

fn present(values: &Values, key: &str) -> Option<String> {
    let value = values.get(key);
    if is_blank(value) {
        return None;
    }
    value.map(|value| value_to_display(value).trim().to_string())
}

/// Map submitted `values` onto a [`Contact`] through `crm.fieldMap`.
pub fn build_contact(crm: &CrmConfig, values: &Values, default_source: &str) -> Contact {
    let mut first_name = None;
    let mut last_name = None;
    let mut email = None;
    let mut phone = None;

    for (form_field, target) in &crm.field_map {
        let Some(kind) = ContactField::parse(target) else {
            continue;
        };
        let slot = match kind {
            ContactField::FirstName => &mut first_name,
            ContactField::LastName => &mut last_name,
            ContactField::Email => &mut email,
            ContactField::Phone => &mut phone,
        };
        if slot.is_none() {
            *slot = present(values, form_field);
        }
    }

    let fallback = |slot: Option<String>, kind: ContactField| {
        slot.or_else(|| {
            kind.fallback_keys()
                .iter()
                .find_map(|key| present(values, key))
        })
    };

    let source = if crm.source.trim().is_empty() {
        default_source.to_string()
    } else {
        crm.source.clone()
    };

    Contact {
        first_name: fallback(first_name, ContactField::FirstName).unwrap_or_default(),
        last_name: fallback(last_name, ContactField::LastName),
        email: fallback(email, ContactField::Email),
        phone: fallback(phone, ContactField::Phone),
        source,
        tags: crm.tags.clone(),
    }
}
