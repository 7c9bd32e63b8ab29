use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::referrals::{ReferralCollection, ReferralCommand};
use super::session::SessionActor;
use super::survey::SurveyActor;
use crate::catalog::ReasonCatalog;
use crate::form::FormState;
use crate::persist::document;
use crate::runtime::{ActorHandle, ActorId, ChildState, FieldEvent, Notification};
use crate::submit::{build_payload, SubmissionReceipt, SubmissionTransport};

/// Phases of the root machine. `Submitted` is terminal; `Submitting` exists
/// only for the duration of one transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Initializing,
    Ready,
    Submitting,
    Submitted,
}

/// Commands routed through the orchestrator. User intent enters here; child
/// notifications are folded back in within the same dispatch step.
#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    /// Field mutation addressed to a session or survey actor by id.
    Field { target: ActorId, event: FieldEvent },
    /// Referral collection commands (add / remove / updated / field).
    Referral(ReferralCommand),
    /// Externally injected child report. Unknown or stopped ids are ignored.
    DataUpdated { child: ActorId, data: ChildState },
    /// Begin the submission phase.
    Submit,
}

impl FormCommand {
    fn label(&self) -> &'static str {
        match self {
            FormCommand::Field { .. } => "field",
            FormCommand::Referral(ReferralCommand::Add) => "referral.add",
            FormCommand::Referral(ReferralCommand::Remove { .. }) => "referral.remove",
            FormCommand::Referral(ReferralCommand::Updated { .. }) => "referral.updated",
            FormCommand::Referral(ReferralCommand::Field { .. }) => "referral.field",
            FormCommand::DataUpdated { .. } => "dataUpdated",
            FormCommand::Submit => "submit",
        }
    }
}

/// Audit record for one orchestrator transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: OrchestratorState,
    pub to: OrchestratorState,
    pub trigger: String,
    pub timestamp: DateTime<Utc>,
}

/// Seed for a new orchestrator: the previously persisted aggregate (if any)
/// plus the raw persisted document, used to recover the survey sub-state.
#[derive(Debug, Clone, Default)]
pub struct FormSeed {
    pub form: FormState,
    pub document: Option<serde_json::Value>,
}

enum ChildActor {
    Session(SessionActor),
    Survey(SurveyActor),
    Referrals(ReferralCollection),
}

/// Root orchestrator. Owns the aggregate form state and the child arena,
/// spawns and stops children reactively, and drives the submit lifecycle.
/// Dispatch is single-threaded run-to-completion; the only suspension point
/// is the transport call inside [`Orchestrator::handle`] for `Submit`.
pub struct Orchestrator {
    state: OrchestratorState,
    form: FormState,
    children: BTreeMap<ActorId, ChildActor>,
    order: Vec<ActorId>,
    catalog: Arc<dyn ReasonCatalog>,
    transport: Arc<dyn SubmissionTransport>,
    last_error: Option<String>,
    receipt: Option<SubmissionReceipt>,
    history: Vec<TransitionRecord>,
}

impl Orchestrator {
    /// Build the orchestrator and run its synchronous initializing phase:
    /// bump the session count, spawn one session actor per index (all
    /// read-only except the newest), spawn the survey actor if any session
    /// requests it, and spawn the referral collection unconditionally.
    pub fn new(
        seed: FormSeed,
        catalog: Arc<dyn ReasonCatalog>,
        transport: Arc<dyn SubmissionTransport>,
    ) -> Self {
        let mut orchestrator = Self {
            state: OrchestratorState::Initializing,
            form: FormState::default(),
            children: BTreeMap::new(),
            order: Vec::new(),
            catalog,
            transport,
            last_error: None,
            receipt: None,
            history: Vec::new(),
        };
        orchestrator.initialize(seed);
        orchestrator.transition(OrchestratorState::Ready, "initialized");
        orchestrator
    }

    fn initialize(&mut self, seed: FormSeed) {
        let prior = seed.form;
        let session_count = prior.session_count + 1;
        self.form.session_count = session_count;

        for index in 1..=session_count {
            let id = ActorId::session(index);
            let seeded = prior.entries.get(&id).and_then(|entry| match entry {
                ChildState::Session(session) => Some(session),
                _ => None,
            });
            let editable = index == session_count;
            let (actor, snapshot) = SessionActor::spawn(index, seeded, editable);
            self.form
                .entries
                .insert(id.clone(), ChildState::Session(snapshot));
            self.children.insert(id.clone(), ChildActor::Session(actor));
            self.order.push(id);
        }

        // Survey sub-state recovered from the persisted document wins over
        // whatever the prior aggregate carried.
        let survey_seed = seed
            .document
            .as_ref()
            .and_then(document::survey_from_document)
            .or_else(|| prior.survey().cloned());
        if let Some(survey) = survey_seed {
            self.form
                .entries
                .insert(ActorId::survey(), ChildState::Survey(survey));
        }
        if self.form.survey_needed() {
            self.spawn_survey();
        }
        self.order.push(ActorId::survey());

        let referral_seed = prior.referrals().to_vec();
        let collection = ReferralCollection::spawn(&referral_seed, Arc::clone(&self.catalog));
        let id = collection.handle_ref().id.clone();
        self.form
            .entries
            .insert(id.clone(), ChildState::Referrals(collection.states()));
        self.children
            .insert(id.clone(), ChildActor::Referrals(collection));
        self.order.push(id);

        info!(
            session_count,
            survey = self.children.contains_key(&ActorId::survey()),
            referrals = referral_seed.len(),
            "form actors initialized"
        );
    }

    /// Process one command to completion. Commands delivered after the
    /// terminal `Submitted` state are dropped.
    pub async fn handle(&mut self, command: FormCommand) {
        match self.state {
            OrchestratorState::Submitted => {
                warn!(command = command.label(), "command dropped: form already submitted");
            }
            OrchestratorState::Ready => match command {
                FormCommand::Field { target, event } => self.route_field(&target, &event),
                FormCommand::Referral(referral_command) => self.route_referral(&referral_command),
                FormCommand::DataUpdated { child, data } => {
                    if !self.children.contains_key(&child) {
                        warn!(child = %child, "data update for unknown or stopped child ignored");
                        return;
                    }
                    self.absorb(Notification { from: child, data });
                }
                FormCommand::Submit => self.run_submission().await,
            },
            // The constructor leaves Initializing before returning, and
            // Submitting never outlives one call; neither is observable here.
            OrchestratorState::Initializing | OrchestratorState::Submitting => {
                warn!(command = command.label(), state = ?self.state, "command dropped");
            }
        }
    }

    fn route_field(&mut self, target: &ActorId, event: &FieldEvent) {
        let Some(child) = self.children.get_mut(target) else {
            warn!(child = %target, "field event for unknown or stopped child ignored");
            return;
        };
        let notification = match child {
            ChildActor::Session(actor) => actor.handle(event).map(|state| Notification {
                from: target.clone(),
                data: ChildState::Session(state),
            }),
            ChildActor::Survey(actor) => actor.handle(event).map(|state| Notification {
                from: target.clone(),
                data: ChildState::Survey(state),
            }),
            ChildActor::Referrals(_) => {
                warn!(child = %target, "referral fields are addressed by position, event ignored");
                None
            }
        };
        if let Some(notification) = notification {
            self.absorb(notification);
        }
    }

    fn route_referral(&mut self, command: &ReferralCommand) {
        let id = ActorId::referrals();
        let Some(ChildActor::Referrals(collection)) = self.children.get_mut(&id) else {
            warn!("referral command with no collection running, ignored");
            return;
        };
        let notification = collection.handle(command);
        if matches!(command, ReferralCommand::Add) {
            // Adds are silent; keep the aggregate's placeholder in step
            // with the collection anyway.
            let states = collection.states();
            self.form.entries.insert(id, ChildState::Referrals(states));
            return;
        }
        if let Some(notification) = notification {
            self.absorb(notification);
        }
    }

    /// Merge a child notification into the aggregate, then re-evaluate the
    /// survey-need predicate and reconcile the survey actor's existence.
    fn absorb(&mut self, notification: Notification) {
        debug!(child = %notification.from, "merging child notification");
        self.form.merge(&notification);
        self.reconcile_survey();
    }

    fn reconcile_survey(&mut self) {
        let needed = self.form.survey_needed();
        let present = self.children.contains_key(&ActorId::survey());
        if needed && !present {
            self.spawn_survey();
        } else if !needed && present {
            self.stop_survey();
        }
    }

    fn spawn_survey(&mut self) {
        let seed = self.form.survey().cloned();
        let (actor, snapshot) = SurveyActor::spawn(seed.as_ref());
        let id = actor.handle_ref().id.clone();
        info!(actor = %id, "survey actor spawned");
        self.form
            .entries
            .insert(id.clone(), ChildState::Survey(snapshot));
        self.children.insert(id, ChildActor::Survey(actor));
    }

    fn stop_survey(&mut self) {
        let id = ActorId::survey();
        self.children.remove(&id);
        self.form.remove(&id);
        info!(actor = %id, "survey actor stopped and sub-state removed");
    }

    async fn run_submission(&mut self) {
        self.transition(OrchestratorState::Submitting, "submit");
        let attempt = Uuid::new_v4();
        let snapshot = self.form.clone();
        let payload = build_payload(&snapshot, self.catalog.as_ref());
        info!(attempt = %attempt, "submitting form");

        match self.transport.deliver(&payload).await {
            Ok(receipt) => {
                self.last_error = None;
                self.receipt = Some(receipt);
                self.transition(OrchestratorState::Submitted, "submission succeeded");
            }
            Err(err) => {
                warn!(attempt = %attempt, error = %err, "submission failed, returning to ready");
                self.last_error = Some(err.to_string());
                self.transition(OrchestratorState::Ready, "submission failed");
            }
        }
    }

    fn transition(&mut self, to: OrchestratorState, trigger: &str) {
        let record = TransitionRecord {
            from: self.state,
            to,
            trigger: trigger.to_string(),
            timestamp: Utc::now(),
        };
        info!(from = ?record.from, to = ?record.to, trigger = %record.trigger, "orchestrator transition");
        self.history.push(record);
        self.state = to;
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn form_state(&self) -> &FormState {
        &self.form
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Display order of the top-level tabs (sessions, survey slot,
    /// referrals). The survey id is listed whether or not its actor is
    /// currently running.
    pub fn tab_order(&self) -> &[ActorId] {
        &self.order
    }

    /// Handles of all currently running children, referral children
    /// included.
    pub fn child_handles(&self) -> Vec<ActorHandle> {
        let mut handles = Vec::new();
        for child in self.children.values() {
            match child {
                ChildActor::Session(actor) => handles.push(actor.handle_ref().clone()),
                ChildActor::Survey(actor) => handles.push(actor.handle_ref().clone()),
                ChildActor::Referrals(collection) => {
                    handles.push(collection.handle_ref().clone());
                    handles.extend(collection.child_handles());
                }
            }
        }
        handles
    }

    /// Id of the one session accepting field updates.
    pub fn editable_session(&self) -> ActorId {
        ActorId::session(self.form.session_count)
    }
}
