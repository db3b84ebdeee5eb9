//! Submission pipeline: one hard validation gate, then best-effort side
//! effects fanned out concurrently.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde::Serialize;
use tracing::{debug, info, warn};

use app_spec::{Document, Values, validate_fields};

use crate::collaborators::{Collaborators, ConversionEvent};
use crate::config::EngineConfig;
use crate::contact::{Contact, build_contact};
use crate::error::{CollaboratorError, SubmitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    Contact,
    Workflow,
    Analytics,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SideEffect::Contact => "contact",
            SideEffect::Workflow => "workflow",
            SideEffect::Analytics => "analytics",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideEffectFailure {
    pub effect: SideEffect,
    pub error: String,
}

/// Operator-facing outcome of an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    pub failures: Vec<SideEffectFailure>,
}

type Outcome = (SideEffect, Result<(), CollaboratorError>);

pub struct SubmissionPipeline {
    collaborators: Collaborators,
    config: EngineConfig,
}

impl SubmissionPipeline {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `values` against every field of `document`, then run the
    /// side effects. Only validation can reject.
    pub async fn submit(
        &self,
        document: &Document,
        values: &Values,
    ) -> Result<SubmissionReport, SubmitError> {
        let slug = document.slug();
        let validation = validate_fields(document.fields(), values);
        if !validation.valid {
            info!(
                slug = %slug,
                fields = %validation.failing_fields().join(","),
                "submission rejected"
            );
            return Err(SubmitError::Validation(validation));
        }

        let contact = document
            .crm
            .as_ref()
            .map(|crm| build_contact(crm, values, &self.config.default_source));
        let event = ConversionEvent {
            name: self.config.event_name(slug),
            metadata: values.clone(),
        };

        let mut effects: Vec<BoxFuture<'_, Outcome>> = Vec::new();
        if let Some(contact) = &contact {
            effects.push(self.guarded(
                SideEffect::Contact,
                self.collaborators.contacts.create_contact(contact),
            ));
            let workflow_id = document
                .crm
                .as_ref()
                .and_then(|crm| crm.workflow_id.as_deref())
                .filter(|id| !id.trim().is_empty());
            match (workflow_id, contact.email.as_deref()) {
                (Some(workflow_id), Some(email)) => effects.push(self.guarded(
                    SideEffect::Workflow,
                    self.collaborators.workflows.enroll(workflow_id, email),
                )),
                (Some(workflow_id), None) => {
                    debug!(slug = %slug, workflow_id, "contact has no email, skipping enrollment")
                }
                (None, _) => {}
            }
        }
        effects.push(self.guarded(
            SideEffect::Analytics,
            self.collaborators.events.record_event(&event),
        ));

        let mut failures = Vec::new();
        for (effect, result) in join_all(effects).await {
            match result {
                Ok(()) => debug!(slug = %slug, collaborator = %effect, "side effect completed"),
                Err(err) => {
                    warn!(
                        slug = %slug,
                        collaborator = %effect,
                        error = %err,
                        "side effect failed"
                    );
                    failures.push(SideEffectFailure {
                        effect,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(slug = %slug, failures = failures.len(), "submission accepted");
        Ok(SubmissionReport {
            accepted: true,
            contact,
            failures,
        })
    }

    fn guarded<'a, F>(&self, effect: SideEffect, call: F) -> BoxFuture<'a, Outcome>
    where
        F: Future<Output = Result<(), CollaboratorError>> + Send + 'a,
    {
        let limit = self.config.side_effect_timeout();
        async move {
            let call = AssertUnwindSafe(call).catch_unwind();
            let result = match tokio::time::timeout(limit, call).await {
                Ok(Ok(result)) => result,
                Ok(Err(panic)) => Err(CollaboratorError::Panicked(panic_message(panic.as_ref()))),
                Err(_) => Err(CollaboratorError::Timeout(limit)),
            };
            (effect, result)
        }
        .boxed()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
