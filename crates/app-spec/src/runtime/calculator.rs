use serde::Serialize;

use crate::expr::{EvalError, evaluate_formula};
use crate::spec::CalculatorSection;
use crate::template::interpolate_template;
use crate::values::{Environment, format_number, number_value};

/// Variable bound to the formula output inside `resultFormat` and later sections.
pub const RESULT_VARIABLE: &str = "result";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatorOutput {
    pub label: String,
    pub value: f64,
    pub display: String,
}

/// Recompute a calculator from the current environment.
pub fn evaluate_calculator(
    section: &CalculatorSection,
    env: &Environment,
) -> Result<CalculatorOutput, EvalError> {
    let value = evaluate_formula(&section.formula, env)?;
    let display = match &section.result_format {
        Some(format) => {
            let scope = env.clone().with(RESULT_VARIABLE, number_value(value));
            interpolate_template(format, &scope)
        }
        None => format_number(value),
    };
    Ok(CalculatorOutput {
        label: section.result_label.clone(),
        value,
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn area() -> CalculatorSection {
        CalculatorSection {
            heading: None,
            inputs: vec![],
            formula: "length * width".into(),
            result_label: "Area".into(),
            result_format: Some("{{result}} sq ft".into()),
        }
    }

    #[test]
    fn formats_result_through_template() {
        let env = Environment::from_json(&json!({ "length": 10, "width": 4 }));
        let output = evaluate_calculator(&area(), &env).expect("output");
        assert_eq!(output.value, 40.0);
        assert_eq!(output.display, "40 sq ft");
        assert_eq!(output.label, "Area");
    }

    #[test]
    fn plain_display_without_format() {
        let mut section = area();
        section.result_format = None;
        let env = Environment::from_json(&json!({ "length": 2.5, "width": 3 }));
        assert_eq!(evaluate_calculator(&section, &env).expect("output").display, "7.5");
    }

    #[test]
    fn unanswered_input_is_an_error() {
        let env = Environment::from_json(&json!({ "length": 10 }));
        assert_eq!(
            evaluate_calculator(&area(), &env),
            Err(EvalError::UnknownVariable("width".into()))
        );
    }
}
