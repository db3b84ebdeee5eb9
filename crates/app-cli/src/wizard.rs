use app_spec::values::{number_value, value_to_display};
use app_spec::{
    Document, Field, FieldError, FieldType, SectionState, SectionView, WizardStep,
};
use app_engine::SubmissionReport;
use serde_json::Value;

/// Typed at any prompt inside a wizard to return to the previous step.
pub const BACK_COMMAND: &str = ":back";

/// Controls which bits of state the runner prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: prompts and results only.
    Clean,
    /// Verbose output: collected values, hidden sections, side-effect failures.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints everything the interactive runner shows.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, document: &Document) {
        if self.header_printed {
            return;
        }
        let settings = document.settings_or_default();
        if settings.show_header {
            println!("App: {}", document.meta.title);
            println!("{}", document.meta.description);
        }
        self.header_printed = true;
    }

    pub fn show_heading(&self, heading: Option<&str>) {
        if let Some(heading) = heading {
            println!("== {} ==", heading);
        }
    }

    pub fn show_text(&self, body: &str) {
        if !body.trim().is_empty() {
            println!("{}", body);
        }
    }

    pub fn show_step(&self, position: usize, total: usize, step: &WizardStep) {
        println!("Step {}/{}: {}", position, total, step.title);
        if let Some(description) = &step.description {
            println!("{}", description);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = prompt.label.clone();
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        if let Some(current) = &prompt.current {
            line.push_str(&format!(" [{}]", current));
        }
        println!("{}", line);
        if self.verbosity.is_verbose()
            && let Some(placeholder) = &prompt.placeholder
        {
            println!("e.g. {}", placeholder);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_field_errors(&self, errors: &[FieldError]) {
        eprintln!("Validation errors:");
        for error in errors {
            eprintln!("  {}: {}", error.field, error.message);
        }
    }

    pub fn show_notice(&self, message: &str) {
        println!("{}", message);
    }

    /// Calculator output, or a result section when visible.
    pub fn show_view(&self, view: &SectionView) {
        match &view.state {
            SectionState::Calculator { outcome } => {
                self.show_heading(view.heading.as_deref());
                match outcome {
                    Ok(output) => println!("{}: {}", output.label, output.display),
                    Err(err) => println!("Could not calculate: {}", err),
                }
            }
            SectionState::Result {
                visible: true,
                rendered,
                ..
            } => {
                self.show_heading(view.heading.as_deref());
                self.show_text(rendered.as_deref().unwrap_or_default());
            }
            SectionState::Result {
                error: Some(err), ..
            } if self.verbosity.is_verbose() => {
                println!("(section {} hidden: {})", view.index, err);
            }
            _ => {}
        }
    }

    pub fn show_completion(&self, success_message: &str, report: &SubmissionReport) {
        println!("Done ✅");
        println!("{}", success_message);
        if self.verbosity.is_verbose() {
            for failure in &report.failures {
                println!("  {} failed: {}", failure.effect, failure.error);
            }
            if let Some(contact) = &report.contact
                && let Ok(pretty) = serde_json::to_string_pretty(contact)
            {
                println!("Contact:\n{}", pretty);
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub label: String,
    pub required: bool,
    pub hint: Option<String>,
    pub current: Option<String>,
    pub placeholder: Option<String>,
}

impl PromptContext {
    pub fn new(field: &Field, current: Option<&Value>) -> Self {
        let label = if field.label.trim().is_empty() {
            field.name.clone()
        } else {
            field.label.clone()
        };
        let current = current
            .or(field.default_value.as_ref())
            .map(value_to_display)
            .filter(|text| !text.is_empty());
        Self {
            label,
            required: field.required,
            hint: hint_for(field),
            current,
            placeholder: field.placeholder.clone(),
        }
    }
}

fn hint_for(field: &Field) -> Option<String> {
    match &field.kind {
        FieldType::Number => Some("(number)".to_string()),
        FieldType::Checkbox => Some("(yes/no)".to_string()),
        FieldType::Email => Some("(email)".to_string()),
        kind if kind.has_options() && !field.options.is_empty() => {
            let choices = field
                .options
                .iter()
                .enumerate()
                .map(|(position, option)| format!("{}={}", position + 1, option.label()))
                .collect::<Vec<_>>();
            Some(format!("({})", choices.join(", ")))
        }
        _ => None,
    }
}

/// A parsed line of input.
#[derive(Debug, PartialEq)]
pub enum Answer {
    Value(Value),
    /// Empty line: keep the current value or fall back to the default.
    Keep,
    Back,
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

pub fn parse_answer(field: &Field, raw: &str) -> Result<Answer, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed == BACK_COMMAND {
        return Ok(Answer::Back);
    }
    if trimmed.is_empty() {
        return Ok(Answer::Keep);
    }
    match &field.kind {
        FieldType::Number => parse_number(trimmed),
        FieldType::Checkbox => parse_boolean(trimmed),
        kind if kind.has_options() && !field.options.is_empty() => parse_option(field, trimmed),
        _ => Ok(Answer::Value(Value::String(trimmed.to_string()))),
    }
}

fn parse_boolean(raw: &str) -> Result<Answer, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Answer::Value(Value::Bool(true))),
        "false" | "f" | "no" | "n" | "0" => Ok(Answer::Value(Value::Bool(false))),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<Answer, AnswerParseError> {
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Answer::Value(number_value(number))),
        Ok(_) => Err(AnswerParseError::new(
            "Please enter a finite number.",
            Some("number must be finite".to_string()),
        )),
        Err(_) => Err(AnswerParseError::new(
            "Please enter a number.",
            Some("expected number".to_string()),
        )),
    }
}

fn parse_option(field: &Field, raw: &str) -> Result<Answer, AnswerParseError> {
    let by_position = raw
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| field.options.get(index));
    let chosen = by_position.or_else(|| {
        field.options.iter().find(|option| {
            option.value().eq_ignore_ascii_case(raw) || option.label().eq_ignore_ascii_case(raw)
        })
    });
    match chosen {
        Some(option) => Ok(Answer::Value(Value::String(option.value().to_string()))),
        None => {
            let allowed = field
                .options
                .iter()
                .map(|option| option.value())
                .collect::<Vec<_>>();
            Err(AnswerParseError::new(
                format!("Choose one of: {}.", allowed.join(", ")),
                Some(format!("allowed values: {}", allowed.join(", "))),
            ))
        }
    }
}
