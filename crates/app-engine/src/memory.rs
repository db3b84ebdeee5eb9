//! In-process collaborators for tests and offline runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::collaborators::{
    Completion, ContactSink, ConversionEvent, DocumentStore, EventRecorder, WorkflowEnroller,
};
use crate::contact::Contact;
use crate::error::CollaboratorError;

pub const ACTIVE: &str = "active";

/// Raw documents keyed by `(slug, status)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<(String, String), Value>>,
}

fn slug_of(raw: &Value) -> String {
    raw.pointer("/meta/slug")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with documents; the slug is read from `meta.slug`.
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let documents = documents
            .into_iter()
            .map(|(status, raw)| ((slug_of(&raw), status.to_string()), raw))
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn insert(&self, status: &str, raw: Value) {
        let key = (slug_of(&raw), status.to_string());
        self.documents.write().await.insert(key, raw);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_by_slug_and_status(
        &self,
        slug: &str,
        status: &str,
    ) -> Result<Option<Value>, CollaboratorError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(slug.to_string(), status.to_string()))
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Value>, CollaboratorError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|((_, status), _)| status == ACTIVE)
            .map(|(_, raw)| raw.clone())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct RecordingContacts {
    contacts: Mutex<Vec<Contact>>,
    failure: Option<CollaboratorError>,
}

impl RecordingContacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `error` and nothing is recorded.
    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub async fn recorded(&self) -> Vec<Contact> {
        self.contacts.lock().await.clone()
    }
}

#[async_trait]
impl ContactSink for RecordingContacts {
    async fn create_contact(&self, contact: &Contact) -> Result<(), CollaboratorError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.contacts.lock().await.push(contact.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingWorkflows {
    enrollments: Mutex<Vec<(String, String)>>,
    failure: Option<CollaboratorError>,
}

impl RecordingWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// `(workflow_id, email)` pairs in call order.
    pub async fn recorded(&self) -> Vec<(String, String)> {
        self.enrollments.lock().await.clone()
    }
}

#[async_trait]
impl WorkflowEnroller for RecordingWorkflows {
    async fn enroll(&self, workflow_id: &str, email: &str) -> Result<(), CollaboratorError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.enrollments
            .lock()
            .await
            .push((workflow_id.to_string(), email.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<ConversionEvent>>,
    failure: Option<CollaboratorError>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub async fn recorded(&self) -> Vec<ConversionEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventRecorder for RecordingEvents {
    async fn record_event(&self, event: &ConversionEvent) -> Result<(), CollaboratorError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Sinks that only log what they receive.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCollaborators;

#[async_trait]
impl ContactSink for LoggingCollaborators {
    async fn create_contact(&self, contact: &Contact) -> Result<(), CollaboratorError> {
        info!(
            first_name = %contact.first_name,
            email = contact.email.as_deref().unwrap_or(""),
            source = %contact.source,
            "contact"
        );
        Ok(())
    }
}

#[async_trait]
impl WorkflowEnroller for LoggingCollaborators {
    async fn enroll(&self, workflow_id: &str, email: &str) -> Result<(), CollaboratorError> {
        info!(workflow_id, email, "workflow enrollment");
        Ok(())
    }
}

#[async_trait]
impl EventRecorder for LoggingCollaborators {
    async fn record_event(&self, event: &ConversionEvent) -> Result<(), CollaboratorError> {
        info!(name = %event.name, fields = event.metadata.len(), "conversion event");
        Ok(())
    }
}

/// Completion backend that answers every prompt with the same text.
#[derive(Debug)]
pub struct StaticCompletion {
    response: Result<String, CollaboratorError>,
    prompts: Mutex<Vec<String>>,
}

impl StaticCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            response: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl Completion for StaticCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.response.clone()
    }
}
