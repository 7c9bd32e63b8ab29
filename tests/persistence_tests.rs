//! File persistence tests: save/load round trips, the missing-document
//! error, and resuming a documentation round from a saved snapshot.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use careform::persist::document;
use careform::{
    ActorId, FieldEvent, FilePersistence, FormCommand, FormSeed, FormState, Orchestrator,
    PersistError, Persistence, ReasonCatalog, ScriptedTransport, StaticReasonCatalog,
};

fn store_in(dir: &TempDir) -> FilePersistence {
    FilePersistence::new(dir.path().join("form-state.json"))
}

#[tokio::test]
async fn save_then_load_round_trips_the_document() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let saved = json!({ "form_state": { "session_count": 2 }, "fields": {} });

    let id = store.save(&saved).await.unwrap();
    assert!(id.starts_with("SESSION-"));

    let loaded = store.load(&id).await.unwrap();
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn loading_a_missing_document_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    match store.load("latest").await {
        Err(PersistError::Missing { path }) => {
            assert!(path.contains("form-state.json"));
        }
        other => panic!("expected a missing-document error, got {other:?}"),
    }
}

#[tokio::test]
async fn save_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let store = FilePersistence::new(dir.path().join("nested").join("deep").join("state.json"));
    store.save(&json!({ "ok": true })).await.unwrap();
    assert_eq!(store.load("any").await.unwrap(), json!({ "ok": true }));
}

#[tokio::test]
async fn a_saved_round_resumes_with_one_more_session_and_the_survey() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let catalog: Arc<dyn ReasonCatalog> = Arc::new(StaticReasonCatalog::default());

    // First round: request and answer the survey, then persist the snapshot
    // in the document shape the binary writes.
    let mut first = Orchestrator::new(
        FormSeed::default(),
        Arc::clone(&catalog),
        Arc::new(ScriptedTransport::succeeding()),
    );
    first
        .handle(FormCommand::Field {
            target: first.editable_session(),
            event: FieldEvent::update("update_gad", json!(true)),
        })
        .await;
    first
        .handle(FormCommand::Field {
            target: ActorId::survey(),
            event: FieldEvent::update("survey", json!({ "1": 2, "2": 2, "3": 2 })),
        })
        .await;

    let snapshot = first.form_state();
    store
        .save(&json!({
            "form_state": snapshot,
            "fields": {
                "behavioral_health_gad": snapshot.survey().map(document::gad_field),
            },
        }))
        .await
        .unwrap();

    // Second round: rebuild the seed the way the binary does.
    let loaded = store.load("latest").await.unwrap();
    let form: FormState =
        serde_json::from_value(loaded.get("form_state").cloned().unwrap()).unwrap();
    let second = Orchestrator::new(
        FormSeed {
            form,
            document: Some(loaded),
        },
        catalog,
        Arc::new(ScriptedTransport::succeeding()),
    );

    assert_eq!(second.form_state().session_count, 2);
    assert!(second.form_state().session(1).unwrap().requests_survey());
    let survey = second.form_state().survey().unwrap();
    assert_eq!(survey.score, 6);
}
