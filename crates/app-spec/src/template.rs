use std::sync::OnceLock;

use handlebars::{Handlebars, handlebars_helper, no_escape};
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::values::{Environment, format_number, number_value, value_to_display};

handlebars_helper!(fixed: |value: Json, digits: u64| match coerce_number(value) {
    Some(number) => format!("{:.*}", digits as usize, number),
    None => value_to_display(value),
});

handlebars_helper!(currency: |value: Json| match coerce_number(value) {
    Some(number) => format_currency(number),
    None => value_to_display(value),
});

handlebars_helper!(percent: |value: Json| match coerce_number(value) {
    Some(number) => format!("{}%", format_number((number * 10_000.0).round() / 100.0)),
    None => value_to_display(value),
});

/// Registers the display helpers available to every template.
pub fn register_default_helpers(registry: &mut Handlebars<'static>) {
    registry.register_helper("fixed", Box::new(fixed));
    registry.register_helper("currency", Box::new(currency));
    registry.register_helper("percent", Box::new(percent));
}

/// Renders `{{name}}` placeholders against an [`Environment`].
///
/// Rendering never fails: unknown names render empty, and templates that do
/// not compile fall back to plain placeholder substitution.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(no_escape);
        register_default_helpers(&mut registry);
        Self { registry }
    }

    /// Shared engine with the default helpers.
    pub fn global() -> &'static TemplateEngine {
        static ENGINE: OnceLock<TemplateEngine> = OnceLock::new();
        ENGINE.get_or_init(TemplateEngine::new)
    }

    pub fn render(&self, template: &str, env: &Environment) -> String {
        let data = template_data(env);
        match self.registry.render_template(template, &data) {
            Ok(rendered) => rendered,
            Err(_) => substitute_placeholders(template, env),
        }
    }
}

/// Replace every `{{name}}` with the string form of `env[name]`, or nothing.
pub fn interpolate_template(template: &str, env: &Environment) -> String {
    TemplateEngine::global().render(template, env)
}

fn template_data(env: &Environment) -> Value {
    let map = env
        .iter()
        .map(|(key, value)| {
            let normalized = match value {
                Value::Number(number) => number.as_f64().map(number_value).unwrap_or(Value::Null),
                other => other.clone(),
            };
            (key.clone(), normalized)
        })
        .collect::<Map<_, _>>();
    Value::Object(map)
}

fn substitute_placeholders(template: &str, env: &Environment) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let pattern = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern")
    });
    pattern
        .replace_all(template, |captures: &Captures| {
            env.get(&captures[1])
                .map(value_to_display)
                .unwrap_or_default()
        })
        .into_owned()
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn format_currency(number: f64) -> String {
    let rounded = format!("{:.2}", number.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let mut grouped = String::new();
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if number < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}
