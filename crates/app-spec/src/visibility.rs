use std::collections::BTreeMap;

use crate::expr::{EvalError, evaluate_guard};
use crate::runtime::{SectionState, evaluate_sections};
use crate::spec::Document;
use crate::values::Environment;

/// Section index to visibility; only result sections can be hidden.
pub type VisibilityMap = BTreeMap<usize, bool>;

/// What to assume for a section whose guard does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    Visible,
    Hidden,
}

/// Evaluate an optional `showIf`; absent or blank guards always show.
pub fn guard_outcome(show_if: Option<&str>, env: &Environment) -> Result<bool, EvalError> {
    match show_if {
        Some(expression) if !expression.trim().is_empty() => evaluate_guard(expression, env),
        _ => Ok(true),
    }
}

pub fn resolve_visibility(
    document: &Document,
    env: &Environment,
    mode: VisibilityMode,
) -> VisibilityMap {
    evaluate_sections(document, env)
        .into_iter()
        .map(|view| {
            let visible = match view.state {
                SectionState::Result {
                    error: Some(_), ..
                } => mode == VisibilityMode::Visible,
                SectionState::Result { visible, .. } => visible,
                _ => true,
            };
            (view.index, visible)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_document;
    use serde_json::json;

    #[test]
    fn blank_guard_shows() {
        let env = Environment::new();
        assert_eq!(guard_outcome(None, &env), Ok(true));
        assert_eq!(guard_outcome(Some("  "), &env), Ok(true));
        assert_eq!(guard_outcome(Some("answered"), &env), Ok(false));
    }

    #[test]
    fn broken_guard_follows_mode() {
        let document = validate_document(&json!({
            "meta": { "title": "T", "slug": "t", "description": "d" },
            "sections": [
                { "type": "text", "body": "x" },
                { "type": "result", "template": "y", "showIf": "((" },
                { "type": "result", "template": "z", "showIf": "interested" }
            ]
        }))
        .expect("document");
        let env = Environment::from_json(&json!({ "interested": "yes" }));

        let shown = resolve_visibility(&document, &env, VisibilityMode::Visible);
        assert_eq!(shown, VisibilityMap::from([(0, true), (1, true), (2, true)]));

        let hidden = resolve_visibility(&document, &env, VisibilityMode::Hidden);
        assert!(!hidden[&1]);
        assert!(hidden[&2]);
    }
}
