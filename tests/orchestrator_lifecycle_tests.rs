//! Orchestrator lifecycle tests
//!
//! These tests verify the root machine end to end: the synchronous
//! initializing phase, reactive spawn/stop of the survey actor, structural
//! no-ops for unknown children, and the submit lifecycle with retry.

use serde_json::json;
use std::sync::Arc;

use careform::{
    ActorId, ActorKind, ChildState, FieldEvent, FormCommand, FormSeed, FormState, Orchestrator,
    OrchestratorState, ReasonCatalog, ScriptedTransport, SessionState, StaticReasonCatalog,
    SubmissionTransport,
};

fn catalog() -> Arc<dyn ReasonCatalog> {
    Arc::new(StaticReasonCatalog::default())
}

fn orchestrator_with(seed: FormSeed, transport: Arc<dyn SubmissionTransport>) -> Orchestrator {
    Orchestrator::new(seed, catalog(), transport)
}

fn fresh_orchestrator() -> Orchestrator {
    orchestrator_with(FormSeed::default(), Arc::new(ScriptedTransport::succeeding()))
}

fn seed_with_sessions(flagged: &[bool]) -> FormSeed {
    let mut form = FormState::default();
    form.session_count = flagged.len() as u32;
    for (i, flag) in flagged.iter().enumerate() {
        let mut session = SessionState::default();
        session.update_gad = Some(*flag);
        form.entries.insert(
            ActorId::session(i as u32 + 1),
            ChildState::Session(session),
        );
    }
    FormSeed {
        form,
        document: None,
    }
}

#[tokio::test]
async fn initialization_spawns_one_session_beyond_the_persisted_count() {
    let orchestrator = orchestrator_with(
        seed_with_sessions(&[false, false]),
        Arc::new(ScriptedTransport::succeeding()),
    );

    assert_eq!(orchestrator.state(), OrchestratorState::Ready);
    assert_eq!(orchestrator.form_state().session_count, 3);
    for index in 1..=3 {
        assert!(orchestrator.form_state().session(index).is_some());
    }
    assert_eq!(orchestrator.editable_session(), ActorId::session(3));

    let handles = orchestrator.child_handles();
    assert_eq!(
        handles
            .iter()
            .filter(|handle| handle.kind == ActorKind::Session)
            .count(),
        3
    );
    assert!(handles
        .iter()
        .any(|handle| handle.kind == ActorKind::ReferralCollection));
    // No session requested the survey.
    assert!(!handles.iter().any(|handle| handle.kind == ActorKind::Survey));
}

#[tokio::test]
async fn survey_actor_present_after_init_iff_a_session_requests_it() {
    let orchestrator = orchestrator_with(
        seed_with_sessions(&[true]),
        Arc::new(ScriptedTransport::succeeding()),
    );
    assert!(orchestrator
        .child_handles()
        .iter()
        .any(|handle| handle.kind == ActorKind::Survey));
    assert!(orchestrator.form_state().survey().is_some());
}

#[tokio::test]
async fn toggling_the_request_flag_spawns_and_stops_the_survey() {
    let mut orchestrator = fresh_orchestrator();
    let session = orchestrator.editable_session();
    assert!(orchestrator.form_state().survey().is_none());

    orchestrator
        .handle(FormCommand::Field {
            target: session.clone(),
            event: FieldEvent::update("update_gad", json!(true)),
        })
        .await;
    assert!(orchestrator.form_state().survey().is_some());
    assert!(orchestrator
        .child_handles()
        .iter()
        .any(|handle| handle.kind == ActorKind::Survey));

    // Give the survey some answers, then withdraw the request: the actor is
    // stopped and its sub-state deleted.
    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::survey(),
            event: FieldEvent::update("survey", json!({ "1": 3 })),
        })
        .await;
    orchestrator
        .handle(FormCommand::Field {
            target: session.clone(),
            event: FieldEvent::update("update_gad", json!(false)),
        })
        .await;
    assert!(orchestrator.form_state().survey().is_none());
    assert!(!orchestrator
        .child_handles()
        .iter()
        .any(|handle| handle.kind == ActorKind::Survey));

    // Events addressed to the stopped actor are silently dropped.
    let before = orchestrator.form_state().clone();
    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::survey(),
            event: FieldEvent::update("survey", json!({ "1": 2 })),
        })
        .await;
    assert_eq!(orchestrator.form_state(), &before);

    // Re-requesting respawns from defaults: the previous answers are gone.
    orchestrator
        .handle(FormCommand::Field {
            target: session,
            event: FieldEvent::update("update_gad", json!(true)),
        })
        .await;
    let survey = orchestrator.form_state().survey().unwrap();
    assert!(survey.answers.is_empty());
    assert_eq!(survey.score, 0);
}

#[tokio::test]
async fn survey_seeded_from_a_loaded_document_when_first_requested() {
    let document = json!({
        "fields": {
            "behavioral_health_gad": {
                "survey": {
                    "1": { "question": "q", "answer": "Several days" },
                    "2": { "question": "q", "answer": "Nearly every day" }
                },
                "how_difficult": "Somewhat difficult"
            }
        }
    });
    let mut orchestrator = orchestrator_with(
        FormSeed {
            form: FormState::default(),
            document: Some(document),
        },
        Arc::new(ScriptedTransport::succeeding()),
    );
    // Loaded sub-state is retained even though no session requests the
    // survey yet, so the actor is not running.
    assert!(orchestrator.form_state().survey().is_some());
    assert!(!orchestrator
        .child_handles()
        .iter()
        .any(|handle| handle.kind == ActorKind::Survey));

    orchestrator
        .handle(FormCommand::Field {
            target: orchestrator.editable_session(),
            event: FieldEvent::update("update_gad", json!(true)),
        })
        .await;
    let survey = orchestrator.form_state().survey().unwrap();
    assert_eq!(survey.score, 4);
    assert_eq!(survey.how_difficult.as_deref(), Some("Somewhat difficult"));
}

#[tokio::test]
async fn unknown_child_events_are_structural_no_ops() {
    let mut orchestrator = fresh_orchestrator();
    let before = orchestrator.form_state().clone();

    orchestrator
        .handle(FormCommand::DataUpdated {
            child: ActorId::session(99),
            data: ChildState::Session(SessionState::default()),
        })
        .await;
    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::session(99),
            event: FieldEvent::update("date", json!("2026-01-01")),
        })
        .await;

    assert_eq!(orchestrator.form_state(), &before);
    assert_eq!(orchestrator.state(), OrchestratorState::Ready);
}

#[tokio::test]
async fn read_only_session_produces_no_change_and_no_notification() {
    let mut orchestrator = orchestrator_with(
        seed_with_sessions(&[false]),
        Arc::new(ScriptedTransport::succeeding()),
    );
    // session-1 is read-only, session-2 is the editable one.
    let before = orchestrator.form_state().clone();
    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::session(1),
            event: FieldEvent::update("date", json!("2026-02-02")),
        })
        .await;
    assert_eq!(orchestrator.form_state(), &before);

    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::session(2),
            event: FieldEvent::update("date", json!("2026-02-02")),
        })
        .await;
    assert_eq!(
        orchestrator.form_state().session(2).unwrap().date.as_deref(),
        Some("2026-02-02")
    );
}

#[tokio::test]
async fn successful_submission_reaches_the_terminal_state() {
    let mut orchestrator = fresh_orchestrator();
    orchestrator.handle(FormCommand::Submit).await;

    assert_eq!(orchestrator.state(), OrchestratorState::Submitted);
    assert!(orchestrator.receipt().is_some());
    assert!(orchestrator.last_error().is_none());

    // Terminal: no further mutation is accepted.
    let before = orchestrator.form_state().clone();
    orchestrator
        .handle(FormCommand::Field {
            target: orchestrator.editable_session(),
            event: FieldEvent::update("date", json!("2026-03-03")),
        })
        .await;
    orchestrator.handle(FormCommand::Submit).await;
    assert_eq!(orchestrator.form_state(), &before);
    assert_eq!(orchestrator.state(), OrchestratorState::Submitted);
}

#[tokio::test]
async fn failed_submission_returns_to_ready_and_retry_is_accepted() {
    let mut orchestrator = orchestrator_with(
        FormSeed::default(),
        Arc::new(ScriptedTransport::new([false], true)),
    );

    orchestrator.handle(FormCommand::Submit).await;
    assert_eq!(orchestrator.state(), OrchestratorState::Ready);
    let error = orchestrator.last_error().unwrap();
    assert!(!error.is_empty());
    assert!(orchestrator.receipt().is_none());

    // The form is still editable between attempts.
    orchestrator
        .handle(FormCommand::Field {
            target: orchestrator.editable_session(),
            event: FieldEvent::update("additional_notes", json!("retrying")),
        })
        .await;

    orchestrator.handle(FormCommand::Submit).await;
    assert_eq!(orchestrator.state(), OrchestratorState::Submitted);
    assert!(orchestrator.receipt().is_some());
    assert!(orchestrator.last_error().is_none());
}

#[tokio::test]
async fn transition_history_records_the_submit_lifecycle() {
    let mut orchestrator = orchestrator_with(
        FormSeed::default(),
        Arc::new(ScriptedTransport::new([false], true)),
    );
    orchestrator.handle(FormCommand::Submit).await;
    orchestrator.handle(FormCommand::Submit).await;

    let states: Vec<(OrchestratorState, OrchestratorState)> = orchestrator
        .history()
        .iter()
        .map(|record| (record.from, record.to))
        .collect();
    assert_eq!(
        states,
        vec![
            (OrchestratorState::Initializing, OrchestratorState::Ready),
            (OrchestratorState::Ready, OrchestratorState::Submitting),
            (OrchestratorState::Submitting, OrchestratorState::Ready),
            (OrchestratorState::Ready, OrchestratorState::Submitting),
            (OrchestratorState::Submitting, OrchestratorState::Submitted),
        ]
    );
}
