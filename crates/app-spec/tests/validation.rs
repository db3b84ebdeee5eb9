use serde_json::{Value, json};

use app_spec::{
    Document, Environment, SchemaError, Section, Values, VisibilityMode, Wizard, WizardError,
    WizardState, lint, parse_document, resolve_visibility, validate_document, validate_fields,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "flooring_calculator" => include_str!("../../../fixtures/flooring_calculator.json"),
        "quote_wizard" => include_str!("../../../fixtures/quote_wizard.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn document(name: &str) -> Document {
    parse_document(fixture(name)).expect("deserialize")
}

fn values(raw: Value) -> Values {
    serde_json::from_value(raw).expect("values")
}

#[test]
fn fixtures_survive_serialize_and_validate() {
    for name in ["flooring_calculator", "quote_wizard"] {
        let doc = document(name);
        let serialized = serde_json::to_value(&doc).expect("serialize");
        let again = validate_document(&serialized).expect("validate");
        assert_eq!(again, doc, "{name}");
    }
}

#[test]
fn fixtures_are_lint_clean() {
    assert!(lint(&document("flooring_calculator")).is_empty());
    assert!(lint(&document("quote_wizard")).is_empty());
}

#[test]
fn unknown_section_type_is_rejected() {
    let mut raw: Value = serde_json::from_str(fixture("flooring_calculator")).expect("json");
    raw["sections"][2]["type"] = json!("chart");
    let err = validate_document(&raw).unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidSectionType {
            index: 2,
            found: "chart".into()
        }
    );
    assert!(err.to_string().contains("sections[2]"));
}

#[test]
fn wizard_walks_steps_with_validation() {
    let doc = document("quote_wizard");
    let Section::Wizard(section) = &doc.sections[0] else {
        panic!("expected wizard");
    };
    let mut wizard = Wizard::new(section);
    assert_eq!(wizard.progress(), (1, 3));

    match wizard.next(&Values::new()) {
        Err(WizardError::Validation(errors)) => {
            let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["full_name", "email"]);
        }
        other => panic!("unexpected {other:?}"),
    }

    let bad_email = values(json!({ "full_name": "Jo", "email": "jo-at-example" }));
    match wizard.next(&bad_email) {
        Err(WizardError::Validation(errors)) => assert_eq!(errors[0].code, "invalid_email"),
        other => panic!("unexpected {other:?}"),
    }

    let mut answers = values(json!({ "full_name": "Jo", "email": "jo@example.com" }));
    assert_eq!(wizard.next(&answers), Ok(WizardState::Step { index: 1 }));

    answers.insert("plan".into(), json!("Growth plan"));
    answers.insert("pages".into(), json!(80));
    match wizard.next(&answers) {
        Err(WizardError::Validation(errors)) => {
            let codes: Vec<_> = errors.iter().map(|e| e.code.as_str()).collect();
            assert_eq!(codes, vec!["invalid_option", "max"]);
            assert_eq!(errors[1].message, "Pages must be at most 50");
        }
        other => panic!("unexpected {other:?}"),
    }

    answers.insert("plan".into(), json!("growth"));
    answers.insert("pages".into(), json!(3));
    assert_eq!(wizard.next(&answers), Ok(WizardState::Step { index: 2 }));
    assert_eq!(wizard.back(), WizardState::Step { index: 1 });
    assert_eq!(wizard.next(&answers), Ok(WizardState::Step { index: 2 }));
    assert_eq!(wizard.next(&answers), Ok(WizardState::Completed));
    assert_eq!(wizard.back(), WizardState::Completed);
    assert_eq!(wizard.next(&answers), Err(WizardError::Completed));
}

#[test]
fn whole_document_validation_collects_every_failure() {
    let doc = document("quote_wizard");
    let result = validate_fields(doc.fields(), &values(json!({ "email": "nope", "pages": 0 })));
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["full_name", "plan"]);
    assert_eq!(result.failing_fields(), vec!["full_name", "email", "plan", "pages"]);
}

#[test]
fn result_visibility_tracks_answers() {
    let doc = document("quote_wizard");
    let empty = resolve_visibility(&doc, &Environment::new(), VisibilityMode::Visible);
    assert!(!empty[&1]);

    let env = Environment::from_json(&json!({ "email": "jo@example.com", "plan": "starter" }));
    let answered = resolve_visibility(&doc, &env, VisibilityMode::Visible);
    assert!(answered[&1]);
}
