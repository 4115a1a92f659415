//! End-to-end pipeline scenarios: structural rejection and ownership
//! authorization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use accord_contract::{Contract, Endpoint, Schema};
use accord_core::{AccordError, Claims, IdentityContext, RequestContext};
use accord_pipeline::{
    Chain, Dispatcher, OperationRegistry, RawRequest, SchemaHandler, Service, ServiceFuture,
    ServiceOutput,
};
use http::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct CreateNote {
    name: String,
}

#[derive(Debug, Clone)]
struct Note {
    id: String,
    name: String,
    owner: String,
}

fn contract() -> Arc<Contract> {
    Arc::new(
        Contract::builder("notes")
            .version("1.0.0")
            .schema(
                "CreateNote",
                Schema::object(vec![("name", Schema::string().required())]),
            )
            .endpoint(
                Endpoint::builder("createNote")
                    .method(Method::POST)
                    .path("/notes")
                    .request_schema("CreateNote")
                    .response(201, None)
                    .build(),
            )
            .endpoint(
                Endpoint::builder("getNote")
                    .method(Method::GET)
                    .path("/notes/{id}")
                    .response(200, None)
                    .build(),
            )
            .build()
            .unwrap(),
    )
}

/// Creates notes owned by the caller, counting invocations.
struct CreateNoteService {
    invocations: Arc<AtomicUsize>,
}

impl Service<CreateNote, Note> for CreateNoteService {
    fn execute<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        identity: &'a IdentityContext,
        req: CreateNote,
    ) -> ServiceFuture<'a, ServiceOutput<Note>> {
        Box::pin(async move {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let owner = identity.subject().unwrap_or("anonymous").to_string();
            Ok(ServiceOutput::Created(Note {
                id: "n1".to_string(),
                name: req.name,
                owner,
            }))
        })
    }
}

/// Returns a fixed note, enforcing ownership.
struct GetNoteService {
    stored: Note,
}

impl Service<String, Note> for GetNoteService {
    fn execute<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        identity: &'a IdentityContext,
        id: String,
    ) -> ServiceFuture<'a, ServiceOutput<Note>> {
        Box::pin(async move {
            if id != self.stored.id {
                return Err(AccordError::not_found_resource("Note", id));
            }
            if identity.subject() != Some(self.stored.owner.as_str()) {
                return Err(AccordError::forbidden());
            }
            Ok(ServiceOutput::One(self.stored.clone()))
        })
    }
}

fn note_response(note: &Note) -> serde_json::Value {
    json!({"id": note.id, "name": note.name, "owner": note.owner})
}

fn dispatcher(invocations: Arc<AtomicUsize>) -> Dispatcher {
    let contract = contract();
    let mut registry = OperationRegistry::new();
    registry
        .register(Chain::new(
            "createNote",
            SchemaHandler::<CreateNote>::new(Arc::clone(&contract), "CreateNote"),
            CreateNoteService { invocations },
            note_response,
        ))
        .unwrap();
    registry
        .register(Chain::new(
            "getNote",
            |raw: &RawRequest| {
                raw.path_param("id")
                    .map(ToString::to_string)
                    .ok_or_else(|| AccordError::validation("missing id"))
            },
            GetNoteService {
                stored: Note {
                    id: "n1".to_string(),
                    name: "first".to_string(),
                    owner: "user-1".to_string(),
                },
            },
            note_response,
        ))
        .unwrap();
    Dispatcher::new(Arc::new(registry))
}

fn user(subject: &str) -> IdentityContext {
    IdentityContext::authenticated(subject, Claims::new(["editor"]))
}

#[tokio::test]
async fn test_structural_failure_short_circuits_the_service() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(Arc::clone(&invocations));

    let result = dispatcher
        .dispatch(
            "createNote",
            &RequestContext::new(),
            &user("user-1"),
            &RawRequest::new().with_body(json!({})),
        )
        .await;

    assert_eq!(result.status, 400);
    let body = result.body.unwrap();
    assert_eq!(body["details"]["field"], "name");
    assert!(body.get("data").is_none());
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_valid_create_invokes_service_once() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let dispatcher = dispatcher(Arc::clone(&invocations));

    let result = dispatcher
        .dispatch(
            "createNote",
            &RequestContext::new(),
            &user("user-1"),
            &RawRequest::new().with_body(json!({"name": "first"})),
        )
        .await;

    assert_eq!(result.status, 201);
    let body = result.body.unwrap();
    assert_eq!(body["data"]["name"], "first");
    assert_eq!(body["data"]["owner"], "user-1");
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_owner_mismatch_is_forbidden() {
    let dispatcher = dispatcher(Arc::new(AtomicUsize::new(0)));

    let result = dispatcher
        .dispatch(
            "getNote",
            &RequestContext::new(),
            &user("intruder"),
            &RawRequest::new().with_path_param("id", "n1"),
        )
        .await;

    assert_eq!(result.status, 403);
    assert_eq!(result.body.unwrap(), json!({"error": "Forbidden"}));
}

#[tokio::test]
async fn test_owner_match_reads_the_note() {
    let dispatcher = dispatcher(Arc::new(AtomicUsize::new(0)));

    let result = dispatcher
        .dispatch(
            "getNote",
            &RequestContext::new(),
            &user("user-1"),
            &RawRequest::new().with_path_param("id", "n1"),
        )
        .await;

    assert_eq!(result.status, 200);
    assert_eq!(result.body.unwrap()["data"]["id"], "n1");
}

#[tokio::test]
async fn test_unknown_note_is_not_found_with_resource_details() {
    let dispatcher = dispatcher(Arc::new(AtomicUsize::new(0)));

    let result = dispatcher
        .dispatch(
            "getNote",
            &RequestContext::new(),
            &user("user-1"),
            &RawRequest::new().with_path_param("id", "n9"),
        )
        .await;

    assert_eq!(result.status, 404);
    let body = result.body.unwrap();
    assert_eq!(body["details"]["resource"], "Note");
    assert_eq!(body["details"]["id"], "n9");
}
