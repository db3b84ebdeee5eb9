use std::sync::Arc;

use serde_json::{Value, json};

use app_engine::memory::{
    MemoryStore, RecordingContacts, RecordingEvents, RecordingWorkflows, StaticCompletion,
};
use app_engine::{
    CollaboratorError, Collaborators, Engine, EngineConfig, GenerateRequest, GenerateResponse,
    SubmitRequest, SubmitResponse,
};

fn fixture(name: &str) -> Value {
    let text = match name {
        "quote_wizard" => include_str!("../../../fixtures/quote_wizard.json"),
        _ => panic!("unknown fixture {}", name),
    };
    serde_json::from_str(text).expect("deserialize")
}

struct Harness {
    engine: Engine,
    contacts: Arc<RecordingContacts>,
    workflows: Arc<RecordingWorkflows>,
    events: Arc<RecordingEvents>,
}

fn harness(contacts: RecordingContacts, completion: StaticCompletion) -> Harness {
    let broken = json!({ "meta": { "title": "Broken", "slug": "broken" }, "sections": [] });
    let store = MemoryStore::with_documents([
        ("active", fixture("quote_wizard")),
        ("active", broken),
        ("draft", json!({ "meta": { "title": "D", "slug": "draft-only", "description": "d" }, "sections": [] })),
    ]);
    let contacts = Arc::new(contacts);
    let workflows = Arc::new(RecordingWorkflows::new());
    let events = Arc::new(RecordingEvents::new());
    let engine = Engine::new(
        Arc::new(store),
        Collaborators::new(contacts.clone(), workflows.clone(), events.clone()),
        Arc::new(completion),
        EngineConfig::default(),
    );
    Harness {
        engine,
        contacts,
        workflows,
        events,
    }
}

fn request(slug: &str, values: Value) -> SubmitRequest {
    SubmitRequest {
        slug: slug.to_string(),
        values: serde_json::from_value(values).expect("values"),
    }
}

#[tokio::test]
async fn accepted_submission_reaches_every_collaborator() {
    let h = harness(RecordingContacts::new(), StaticCompletion::new(""));
    let response = h
        .engine
        .submit_request(&request(
            "website-quote",
            json!({ "full_name": "Jo", "email": "jo@x.com", "plan": "starter" }),
        ))
        .await;
    assert_eq!(response, SubmitResponse::accepted());

    let contacts = h.contacts.recorded().await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].first_name, "Jo");
    assert_eq!(contacts[0].source, "website-quote");
    assert!(contacts[0].tags.contains("lead"));
    assert_eq!(
        h.workflows.recorded().await,
        vec![("wf-quote-nurture".to_string(), "jo@x.com".to_string())]
    );
    assert_eq!(h.events.recorded().await[0].name, "app_submission_website-quote");
}

#[tokio::test]
async fn failing_contact_sink_is_invisible_to_the_submitter() {
    let h = harness(
        RecordingContacts::failing(CollaboratorError::Transport("connection reset".into())),
        StaticCompletion::new(""),
    );
    let response = h
        .engine
        .submit_request(&request(
            "website-quote",
            json!({ "full_name": "Jo", "email": "jo@x.com", "plan": "growth" }),
        ))
        .await;
    assert!(response.is_accepted());
    assert_eq!(h.events.recorded().await.len(), 1);
}

#[tokio::test]
async fn invalid_values_are_rejected_with_every_field() {
    let h = harness(RecordingContacts::new(), StaticCompletion::new(""));
    let response = h
        .engine
        .submit_request(&request("website-quote", json!({ "email": "jo" })))
        .await;
    let SubmitResponse::Rejected { accepted, errors } = response else {
        panic!("expected rejection");
    };
    assert!(!accepted);
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["full_name", "email", "plan"]);
    assert!(h.events.recorded().await.is_empty());
}

#[tokio::test]
async fn unknown_or_inactive_slug_is_not_found() {
    let h = harness(RecordingContacts::new(), StaticCompletion::new(""));
    let response = h.engine.submit_request(&request("draft-only", json!({}))).await;
    assert_eq!(response, SubmitResponse::failed("app 'draft-only' not found"));
}

#[tokio::test]
async fn catalog_skips_invalid_documents() {
    let h = harness(RecordingContacts::new(), StaticCompletion::new(""));
    let catalog = h.engine.catalog().await.expect("catalog");
    let slugs: Vec<_> = catalog.iter().map(|meta| meta.slug.as_str()).collect();
    assert_eq!(slugs, vec!["website-quote"]);
}

#[tokio::test]
async fn json_endpoints_round_trip() {
    let h = harness(
        RecordingContacts::new(),
        StaticCompletion::new(
            "```json\n{\"isComplex\":true,\"sourceCode\":\"<canvas></canvas>\",\
             \"meta\":{\"title\":\"Game\",\"slug\":\"game\",\"description\":\"A game\"},\"sections\":[]}\n```",
        ),
    );

    let body = h
        .engine
        .submit_json(r#"{"slug":"website-quote","values":{"full_name":"Jo","email":"jo@x.com","plan":"starter"}}"#)
        .await;
    assert_eq!(serde_json::from_str::<Value>(&body).expect("json"), json!({ "accepted": true }));

    let body = h.engine.submit_json("not json").await;
    let parsed: Value = serde_json::from_str(&body).expect("json");
    assert!(parsed["error"].as_str().expect("error").starts_with("invalid request"));

    let body = h.engine.generate_json(r#"{"input":"a snake game"}"#).await;
    let parsed: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(parsed["isComplex"], true);
    assert_eq!(parsed["sourceCode"], "<canvas></canvas>");
    assert_eq!(parsed["definition"]["meta"]["slug"], "game");
    assert!(parsed["definition"].get("isComplex").is_none());
}

#[tokio::test]
async fn generation_errors_are_reported_verbatim() {
    let h = harness(RecordingContacts::new(), StaticCompletion::new("I cannot do that"));
    let response = h
        .engine
        .generate_request(&GenerateRequest {
            input: "a tip calculator".into(),
        })
        .await;
    let GenerateResponse::Failed { error } = response else {
        panic!("expected failure");
    };
    assert!(error.starts_with("malformed output"));
}
