//! Per-section behavior over a live environment.
//!
//! Calculators and result sections are stateless and are recomputed from the
//! environment on every change; wizards carry a [`WizardState`].

pub mod calculator;
pub mod wizard;

use crate::expr::EvalError;
use crate::spec::{Document, Section};
use crate::template::interpolate_template;
use crate::values::Environment;
use crate::visibility::guard_outcome;

pub use calculator::{CalculatorOutput, RESULT_VARIABLE, evaluate_calculator};
pub use wizard::{Wizard, WizardError, WizardState};

/// Evaluated state of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionState {
    Text { body: String },
    Form { fields: Vec<String> },
    Calculator { outcome: Result<CalculatorOutput, EvalError> },
    Wizard { steps: Vec<String> },
    Result {
        visible: bool,
        rendered: Option<String>,
        error: Option<EvalError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub index: usize,
    pub kind: &'static str,
    pub heading: Option<String>,
    pub state: SectionState,
}

impl SectionView {
    pub fn error(&self) -> Option<&EvalError> {
        match &self.state {
            SectionState::Calculator { outcome: Err(err) } => Some(err),
            SectionState::Result { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

/// Walk the sections in order.
///
/// Each successful calculator binds its value as `result` for the sections
/// after it. An evaluation error stays local to its section.
pub fn evaluate_sections(document: &Document, env: &Environment) -> Vec<SectionView> {
    let mut scope = env.clone();
    document
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let state = evaluate_section(section, &mut scope);
            SectionView {
                index,
                kind: section.kind(),
                heading: section.heading().map(str::to_string),
                state,
            }
        })
        .collect()
}

fn evaluate_section(section: &Section, scope: &mut Environment) -> SectionState {
    match section {
        Section::Text(text) => SectionState::Text {
            body: text.body.clone(),
        },
        Section::Form(form) => SectionState::Form {
            fields: form.fields.iter().map(|field| field.name.clone()).collect(),
        },
        Section::Calculator(calculator) => {
            let outcome = evaluate_calculator(calculator, scope);
            if let Ok(output) = &outcome {
                scope.bind_number(RESULT_VARIABLE, output.value);
            }
            SectionState::Calculator { outcome }
        }
        Section::Wizard(wizard) => SectionState::Wizard {
            steps: wizard.steps.iter().map(|step| step.title.clone()).collect(),
        },
        Section::Result(result) => match guard_outcome(result.show_if.as_deref(), scope) {
            Ok(true) => SectionState::Result {
                visible: true,
                rendered: Some(interpolate_template(&result.template, scope)),
                error: None,
            },
            Ok(false) => SectionState::Result {
                visible: false,
                rendered: None,
                error: None,
            },
            Err(err) => SectionState::Result {
                visible: false,
                rendered: None,
                error: Some(err),
            },
        },
    }
}
