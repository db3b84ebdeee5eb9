use serde_json::{Map, Value, json};

use crate::runtime::{SectionState, evaluate_sections};
use crate::spec::{Document, Field, Settings};
use crate::validate::validate_fields;
use crate::values::{Environment, Values, value_to_display};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Required fields are still unanswered.
    NeedInput,
    /// Everything required is answered and every section evaluated.
    Complete,
    /// A formula or guard failed to evaluate.
    Error,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }
}

/// One input as a renderer needs it.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub current_value: Option<Value>,
    pub options: Vec<String>,
}

/// Evaluated section ready for display.
#[derive(Debug, Clone)]
pub struct RenderSection {
    pub index: usize,
    pub kind: &'static str,
    pub heading: Option<String>,
    pub visible: bool,
    pub content: Option<String>,
    pub error: Option<String>,
    pub fields: Vec<RenderField>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub status: RenderStatus,
    pub missing_required: Vec<String>,
    pub settings: Settings,
    pub sections: Vec<RenderSection>,
}

/// Evaluate `document` against `values` and collect what a renderer shows.
pub fn build_render_payload(document: &Document, values: &Values) -> RenderPayload {
    let env = Environment::for_document(document, values);
    let views = evaluate_sections(document, &env);
    let effective: Values = env
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let validation = validate_fields(document.fields(), &effective);

    let sections = document
        .sections
        .iter()
        .zip(views)
        .map(|(section, view)| {
            let (visible, content) = match &view.state {
                SectionState::Text { body } => (true, Some(body.clone())),
                SectionState::Calculator { outcome } => (
                    true,
                    outcome.as_ref().ok().map(|output| {
                        format!("{}: {}", output.label, output.display)
                    }),
                ),
                SectionState::Result {
                    visible, rendered, ..
                } => (*visible, rendered.clone()),
                SectionState::Form { .. } | SectionState::Wizard { .. } => (true, None),
            };
            RenderSection {
                index: view.index,
                kind: view.kind,
                heading: view.heading.clone(),
                visible,
                content,
                error: view.error().map(ToString::to_string),
                fields: section.fields().map(|field| render_field(field, &env)).collect(),
            }
        })
        .collect::<Vec<_>>();

    let status = if !validation.missing_required.is_empty() {
        RenderStatus::NeedInput
    } else if sections.iter().any(|section| section.error.is_some()) {
        RenderStatus::Error
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        slug: document.meta.slug.clone(),
        title: document.meta.title.clone(),
        description: document.meta.description.clone(),
        status,
        missing_required: validation.missing_required,
        settings: document.settings_or_default(),
        sections,
    }
}

fn render_field(field: &Field, env: &Environment) -> RenderField {
    RenderField {
        name: field.name.clone(),
        label: field.label.clone(),
        kind: field.kind.to_string(),
        required: field.required,
        placeholder: field.placeholder.clone(),
        current_value: env.get(&field.name).cloned(),
        options: field
            .options
            .iter()
            .map(|option| option.value().to_string())
            .collect(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let sections = payload
        .sections
        .iter()
        .map(|section| {
            let mut map = Map::new();
            map.insert("index".into(), json!(section.index));
            map.insert("type".into(), Value::String(section.kind.to_string()));
            map.insert(
                "heading".into(),
                section.heading.clone().map(Value::String).unwrap_or(Value::Null),
            );
            map.insert("visible".into(), Value::Bool(section.visible));
            if let Some(content) = &section.content {
                map.insert("content".into(), Value::String(content.clone()));
            }
            if let Some(error) = &section.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            if !section.fields.is_empty() {
                let fields = section.fields.iter().map(field_json).collect::<Vec<_>>();
                map.insert("fields".into(), Value::Array(fields));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "slug": payload.slug,
        "title": payload.title,
        "description": payload.description,
        "status": payload.status.as_str(),
        "missingRequired": payload.missing_required,
        "submitButtonText": payload.settings.submit_button_text,
        "sections": sections,
    })
}

fn field_json(field: &RenderField) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(field.name.clone()));
    map.insert("label".into(), Value::String(field.label.clone()));
    map.insert("type".into(), Value::String(field.kind.clone()));
    map.insert("required".into(), Value::Bool(field.required));
    if let Some(placeholder) = &field.placeholder {
        map.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if let Some(value) = &field.current_value {
        map.insert("currentValue".into(), value.clone());
    }
    if !field.options.is_empty() {
        map.insert("options".into(), json!(field.options));
    }
    Value::Object(map)
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("App: {} ({})", payload.title, payload.slug));
    lines.push(format!("Status: {}", payload.status.as_str()));
    if !payload.missing_required.is_empty() {
        lines.push(format!("Missing: {}", payload.missing_required.join(", ")));
    }

    for section in payload.sections.iter().filter(|section| section.visible) {
        let heading = section
            .heading
            .as_deref()
            .map(|heading| format!(" {heading}"))
            .unwrap_or_default();
        lines.push(format!("[{}]{}", section.kind, heading));
        for field in &section.fields {
            let mut entry = format!(" - {} ({})", field.name, field.label);
            if field.required {
                entry.push_str(" [required]");
            }
            if let Some(value) = &field.current_value {
                entry.push_str(&format!(" = {}", value_to_display(value)));
            }
            lines.push(entry);
        }
        if let Some(content) = &section.content {
            lines.push(format!("   {content}"));
        }
        if let Some(error) = &section.error {
            lines.push(format!("   error: {error}"));
        }
    }

    lines.join("\n")
}
