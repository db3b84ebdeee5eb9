use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{WizardSection, WizardStep};
use crate::validate::{FieldError, validate_fields};
use crate::values::Values;

/// Position of a wizard: a step index, or the terminal completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    Step { index: usize },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("current step has invalid fields: {}", FieldList(.0))]
    Validation(Vec<FieldError>),
    #[error("wizard is already completed")]
    Completed,
}

struct FieldList<'a>(&'a [FieldError]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|error| error.field.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Step-by-step driver over a [`WizardSection`].
#[derive(Debug, Clone)]
pub struct Wizard<'a> {
    section: &'a WizardSection,
    state: WizardState,
}

impl<'a> Wizard<'a> {
    pub fn new(section: &'a WizardSection) -> Self {
        let state = if section.steps.is_empty() {
            WizardState::Completed
        } else {
            WizardState::Step { index: 0 }
        };
        Self { section, state }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == WizardState::Completed
    }

    pub fn current_step(&self) -> Option<&'a WizardStep> {
        match self.state {
            WizardState::Step { index } => self.section.steps.get(index),
            WizardState::Completed => None,
        }
    }

    /// `(position, total)` with position 1-based; equals `total` once completed.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.section.steps.len();
        match self.state {
            WizardState::Step { index } => (index + 1, total),
            WizardState::Completed => (total, total),
        }
    }

    /// Advance if the current step's fields validate against `values`.
    pub fn next(&mut self, values: &Values) -> Result<WizardState, WizardError> {
        let WizardState::Step { index } = self.state else {
            return Err(WizardError::Completed);
        };
        let step = &self.section.steps[index];
        let result = validate_fields(&step.fields, values);
        if !result.valid {
            return Err(WizardError::Validation(result.errors));
        }
        self.state = if index + 1 < self.section.steps.len() {
            WizardState::Step { index: index + 1 }
        } else {
            WizardState::Completed
        };
        Ok(self.state)
    }

    /// Step back; a no-op on the first step and once completed.
    pub fn back(&mut self) -> WizardState {
        if let WizardState::Step { index } = self.state
            && index > 0
        {
            self.state = WizardState::Step { index: index - 1 };
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Field, FieldType};
    use serde_json::json;

    fn section() -> WizardSection {
        WizardSection {
            heading: Some("Intake".into()),
            steps: vec![
                WizardStep {
                    title: "About you".into(),
                    description: None,
                    fields: vec![Field::new("name", "Name", FieldType::Text).required()],
                },
                WizardStep {
                    title: "Project".into(),
                    description: None,
                    fields: vec![Field::new("budget", "Budget", FieldType::Number)],
                },
            ],
        }
    }

    #[test]
    fn next_requires_current_step_fields() {
        let section = section();
        let mut wizard = Wizard::new(&section);

        let err = wizard.next(&Values::new()).unwrap_err();
        match &err {
            WizardError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "name");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("name"));
        assert_eq!(wizard.state(), WizardState::Step { index: 0 });

        let values = Values::from([("name".to_string(), json!("A"))]);
        assert_eq!(wizard.next(&values), Ok(WizardState::Step { index: 1 }));
        assert_eq!(wizard.current_step().map(|step| step.title.as_str()), Some("Project"));
    }

    #[test]
    fn last_next_completes_and_is_terminal() {
        let section = section();
        let mut wizard = Wizard::new(&section);
        let values = Values::from([("name".to_string(), json!("A"))]);
        wizard.next(&values).expect("step 0");
        assert_eq!(wizard.next(&values), Ok(WizardState::Completed));
        assert!(wizard.is_complete());
        assert_eq!(wizard.next(&values), Err(WizardError::Completed));
        assert_eq!(wizard.back(), WizardState::Completed);
        assert_eq!(wizard.progress(), (2, 2));
    }

    #[test]
    fn back_is_always_allowed() {
        let section = section();
        let mut wizard = Wizard::new(&section);
        let values = Values::from([("name".to_string(), json!("A"))]);
        assert_eq!(wizard.next(&values), Ok(WizardState::Step { index: 1 }));
        assert_eq!(wizard.back(), WizardState::Step { index: 0 });
        assert_eq!(wizard.back(), WizardState::Step { index: 0 });
    }

    #[test]
    fn empty_wizard_starts_completed() {
        let section = WizardSection::default();
        assert!(Wizard::new(&section).is_complete());
    }
}
