use std::sync::Arc;

use tracing::{error, warn};

use app_spec::{Document, GeneratedApp, GenerationError, Meta, validate_document};

use crate::collaborators::{Collaborators, Completion, DocumentStore};
use crate::config::EngineConfig;
use crate::error::{CollaboratorError, SubmitError};
use crate::generation::generate;
use crate::pipeline::{SubmissionPipeline, SubmissionReport};
use crate::wire::{
    GenerateRequest, GenerateResponse, SubmitRequest, SubmitResponse, parse_request, respond,
};

/// Storage, submission and generation behind one handle.
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    completion: Arc<dyn Completion>,
    pipeline: SubmissionPipeline,
}

impl Engine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collaborators: Collaborators,
        completion: Arc<dyn Completion>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            completion,
            pipeline: SubmissionPipeline::new(collaborators, config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.pipeline.config()
    }

    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.pipeline
    }

    /// Fetch and validate the document published under `slug`.
    pub async fn load(&self, slug: &str) -> Result<Document, SubmitError> {
        let raw = self
            .store
            .get_by_slug_and_status(slug, &self.config().store_status)
            .await?
            .ok_or_else(|| SubmitError::NotFound(slug.to_string()))?;
        Ok(validate_document(&raw)?)
    }

    pub async fn submit(&self, request: &SubmitRequest) -> Result<SubmissionReport, SubmitError> {
        let document = self.load(&request.slug).await?;
        self.pipeline.submit(&document, &request.values).await
    }

    /// Submitter-facing outcome; integration failures never show up here.
    pub async fn submit_request(&self, request: &SubmitRequest) -> SubmitResponse {
        match self.submit(request).await {
            Ok(_) => SubmitResponse::accepted(),
            Err(SubmitError::Validation(result)) => SubmitResponse::rejected(result.errors),
            Err(err) => {
                if matches!(err, SubmitError::Store(_) | SubmitError::Schema(_)) {
                    error!(slug = %request.slug, error = %err, "failed to load document");
                }
                SubmitResponse::failed(err.to_string())
            }
        }
    }

    pub async fn generate(&self, input: &str) -> Result<GeneratedApp, GenerationError> {
        generate(self.completion.as_ref(), input).await
    }

    pub async fn generate_request(&self, request: &GenerateRequest) -> GenerateResponse {
        match self.generate(&request.input).await {
            Ok(app) => app.into(),
            Err(err) => GenerateResponse::Failed {
                error: err.to_string(),
            },
        }
    }

    /// Listing metadata of every active document that still validates.
    pub async fn catalog(&self) -> Result<Vec<Meta>, CollaboratorError> {
        let documents = self.store.list_active().await?;
        Ok(documents
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| match validate_document(raw) {
                Ok(document) => Some(document.meta),
                Err(err) => {
                    warn!(position, error = %err, "skipping invalid stored document");
                    None
                }
            })
            .collect())
    }

    /// JSON-in/JSON-out submission endpoint.
    pub async fn submit_json(&self, body: &str) -> String {
        match parse_request::<SubmitRequest>(body) {
            Ok(request) => respond(&self.submit_request(&request).await),
            Err(error) => error,
        }
    }

    /// JSON-in/JSON-out generation endpoint.
    pub async fn generate_json(&self, body: &str) -> String {
        match parse_request::<GenerateRequest>(body) {
            Ok(request) => respond(&self.generate_request(&request).await),
            Err(error) => error,
        }
    }
}
