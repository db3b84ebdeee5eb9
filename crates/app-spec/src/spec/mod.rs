pub mod document;
pub mod field;
pub mod section;

pub use document::{CrmConfig, Document, Meta, Settings};
pub use field::{Field, FieldOption, FieldType, FieldValidation, is_identifier};
pub use section::{
    CalculatorSection, FormSection, ResultSection, SECTION_TYPES, Section, TextSection,
    WizardSection, WizardStep,
};
