use statig::blocking::StateMachine;
use statig::prelude::*;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::ReasonCatalog;
use crate::form::ReferralState;
use crate::runtime::{ActorHandle, ActorId, ActorKind, FieldEvent};

pub type ReferralOutbox = Vec<ReferralState>;

/// One referral record actor. Two-phase: until a reason is chosen only a
/// `primary_reason` update is accepted; once configured every field update
/// is, and there is no path back.
pub struct ReferralMachine {
    pub(crate) form: ReferralState,
    catalog: Arc<dyn ReasonCatalog>,
}

impl ReferralMachine {
    /// Reason -> template merge: rebuild the record for the new reason while
    /// preserving the referral date verbatim.
    fn apply_reason(&mut self, value: &serde_json::Value) {
        let reason = value.as_str().unwrap_or_default();
        let template = self.catalog.template(reason);
        self.form.reclassify(reason, template.as_ref());
    }
}

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl ReferralMachine {
    #[state]
    fn idle(&mut self, context: &mut ReferralOutbox, event: &FieldEvent) -> Response<State> {
        let _ = context;
        match event {
            FieldEvent::Init if self.form.is_classified() => Transition(State::configured()),
            FieldEvent::Init => Transition(State::editing()),
            _ => Handled,
        }
    }

    #[state]
    fn editing(&mut self, context: &mut ReferralOutbox, event: &FieldEvent) -> Response<State> {
        match event {
            FieldEvent::UpdateField { key, value } if key == "primary_reason" => {
                self.apply_reason(value);
                context.push(self.form.clone());
                Transition(State::configured())
            }
            _ => Handled,
        }
    }

    #[state]
    fn configured(&mut self, context: &mut ReferralOutbox, event: &FieldEvent) -> Response<State> {
        match event {
            FieldEvent::UpdateField { key, value } => {
                if key == "primary_reason" {
                    self.apply_reason(value);
                } else {
                    self.form.apply_field(key, value.clone());
                }
                context.push(self.form.clone());
                Handled
            }
            _ => Handled,
        }
    }
}

pub struct ReferralActor {
    handle: ActorHandle,
    machine: StateMachine<ReferralMachine>,
}

impl ReferralActor {
    pub fn spawn(serial: u64, seed: ReferralState, catalog: Arc<dyn ReasonCatalog>) -> Self {
        let id = ActorId::referral(serial);
        let mut machine = ReferralMachine {
            form: seed,
            catalog,
        }
        .state_machine();
        let mut outbox = ReferralOutbox::new();
        machine.handle_with_context(&FieldEvent::Init, &mut outbox);
        debug!(actor = %id, "referral actor spawned");
        Self {
            handle: ActorHandle::new(id, ActorKind::Referral),
            machine,
        }
    }

    pub fn handle(&mut self, event: &FieldEvent) -> Option<ReferralState> {
        let mut outbox = ReferralOutbox::new();
        self.machine.handle_with_context(event, &mut outbox);
        outbox.pop()
    }

    pub fn handle_ref(&self) -> &ActorHandle {
        &self.handle
    }

    pub fn is_configured(&self) -> bool {
        *self.machine.state() == State::configured()
    }

    pub fn form(&self) -> &ReferralState {
        &self.machine.form
    }
}
