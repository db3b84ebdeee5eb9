#![allow(missing_docs)]

pub mod expr;
pub mod generation;
pub mod lint;
pub mod render;
pub mod runtime;
pub mod schema;
pub mod spec;
pub mod template;
pub mod validate;
pub mod values;
pub mod visibility;

pub use expr::{EvalError, Expr, Scalar, evaluate_formula, evaluate_guard};
pub use generation::{GeneratedApp, GenerationError, build_prompt, parse_generated};
pub use lint::{LintCode, LintIssue, lint};
pub use render::{
    RenderField, RenderPayload, RenderSection, RenderStatus, build_render_payload, render_json_ui,
    render_text,
};
pub use runtime::{
    CalculatorOutput, SectionState, SectionView, Wizard, WizardError, WizardState,
    evaluate_calculator, evaluate_sections,
};
pub use schema::{SchemaError, parse_document, validate_document};
pub use spec::{
    CalculatorSection, CrmConfig, Document, Field, FieldOption, FieldType, FieldValidation,
    FormSection, Meta, ResultSection, Section, Settings, TextSection, WizardSection, WizardStep,
};
pub use template::{TemplateEngine, interpolate_template, register_default_helpers};
pub use validate::{FieldError, ValidationResult, validate_fields, validate_value};
pub use values::{Environment, Values};
pub use visibility::{VisibilityMap, VisibilityMode, resolve_visibility};
