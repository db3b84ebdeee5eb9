pub mod collaborators;
pub mod config;
pub mod contact;
pub mod engine;
pub mod error;
pub mod generation;
pub mod memory;
pub mod pipeline;
pub mod wire;

pub use collaborators::{
    Collaborators, Completion, ContactSink, ConversionEvent, DocumentStore, EventRecorder,
    WorkflowEnroller,
};
pub use config::{CONFIG_ENV, ConfigError, EngineConfig};
pub use contact::{Contact, build_contact};
pub use engine::Engine;
pub use error::{CollaboratorError, SubmitError};
pub use generation::generate;
pub use pipeline::{SideEffect, SideEffectFailure, SubmissionPipeline, SubmissionReport};
pub use wire::{GenerateRequest, GenerateResponse, SubmitRequest, SubmitResponse, respond};
