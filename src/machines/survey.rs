use statig::blocking::StateMachine;
use statig::prelude::*;
use tracing::debug;

use crate::form::SurveyState;
use crate::runtime::{ActorHandle, ActorId, ActorKind, FieldEvent};

pub type SurveyOutbox = Vec<SurveyState>;

/// The GAD-7 screening tab. Always mutable while it exists; the derived
/// score and severity band are recomputed on every answer change.
pub struct SurveyMachine {
    pub(crate) form: SurveyState,
}

#[state_machine(
    initial = "State::editing()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl SurveyMachine {
    #[state]
    fn editing(&mut self, context: &mut SurveyOutbox, event: &FieldEvent) -> Response<State> {
        match event {
            FieldEvent::UpdateField { key, value } => {
                self.form.apply_field(key, value.clone());
                context.push(self.form.clone());
                Handled
            }
            FieldEvent::SetData { data } => {
                self.form = SurveyState::from_data(data);
                context.push(self.form.clone());
                Handled
            }
            FieldEvent::Init => Handled,
        }
    }
}

pub struct SurveyActor {
    handle: ActorHandle,
    machine: StateMachine<SurveyMachine>,
}

impl SurveyActor {
    /// Spawn the survey actor, seeded with any previously retained survey
    /// sub-state. Returns the actor and its initial state snapshot.
    pub fn spawn(seed: Option<&SurveyState>) -> (Self, SurveyState) {
        let form = seed.cloned().unwrap_or_default();
        let snapshot = form.clone();
        let id = ActorId::survey();
        debug!(actor = %id, seeded = seed.is_some(), "survey actor spawned");
        (
            Self {
                handle: ActorHandle::new(id, ActorKind::Survey),
                machine: SurveyMachine { form }.state_machine(),
            },
            snapshot,
        )
    }

    pub fn handle(&mut self, event: &FieldEvent) -> Option<SurveyState> {
        let mut outbox = SurveyOutbox::new();
        self.machine.handle_with_context(event, &mut outbox);
        outbox.pop()
    }

    pub fn handle_ref(&self) -> &ActorHandle {
        &self.handle
    }

    pub fn form(&self) -> &SurveyState {
        &self.machine.form
    }
}
