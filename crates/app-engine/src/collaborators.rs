//! Seams to the outside world. Every integration is an object-safe async
//! trait so the engine can hold it as `Arc<dyn …>`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use app_spec::Values;

use crate::contact::Contact;
use crate::error::CollaboratorError;

/// Analytics/conversion event emitted for every accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub name: String,
    pub metadata: Values,
}

/// Owner of stored documents, returned as raw JSON.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_slug_and_status(
        &self,
        slug: &str,
        status: &str,
    ) -> Result<Option<Value>, CollaboratorError>;

    async fn list_active(&self) -> Result<Vec<Value>, CollaboratorError>;
}

#[async_trait]
pub trait ContactSink: Send + Sync {
    async fn create_contact(&self, contact: &Contact) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait WorkflowEnroller: Send + Sync {
    async fn enroll(&self, workflow_id: &str, email: &str) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record_event(&self, event: &ConversionEvent) -> Result<(), CollaboratorError>;
}

/// Text completion backend used to draft documents.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// The best-effort sinks a submission fans out to.
#[derive(Clone)]
pub struct Collaborators {
    pub contacts: Arc<dyn ContactSink>,
    pub workflows: Arc<dyn WorkflowEnroller>,
    pub events: Arc<dyn EventRecorder>,
}

impl Collaborators {
    pub fn new(
        contacts: Arc<dyn ContactSink>,
        workflows: Arc<dyn WorkflowEnroller>,
        events: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            contacts,
            workflows,
            events,
        }
    }
}
