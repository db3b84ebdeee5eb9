use tracing::{debug, info, warn};

use app_spec::{GeneratedApp, GenerationError, build_prompt, lint, parse_generated};

use crate::collaborators::Completion;

/// Draft a document from a freeform request.
pub async fn generate(
    completion: &dyn Completion,
    input: &str,
) -> Result<GeneratedApp, GenerationError> {
    let request = input.trim();
    if request.is_empty() {
        return Err(GenerationError::EmptyInput);
    }

    let prompt = build_prompt(request);
    debug!(prompt_len = prompt.len(), "requesting document draft");
    let raw = completion
        .complete(&prompt)
        .await
        .map_err(|err| GenerationError::Collaborator(err.to_string()))?;

    let generated = parse_generated(&raw).inspect_err(|err| {
        warn!(error = %err, "generated document rejected");
    })?;

    let slug = generated.document.slug();
    for issue in lint(&generated.document) {
        warn!(
            slug = %slug,
            location = %issue.location,
            code = ?issue.code,
            "{}",
            issue.message
        );
    }
    info!(slug = %slug, is_complex = generated.is_complex, "document generated");
    Ok(generated)
}
