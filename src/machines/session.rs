use statig::blocking::StateMachine;
use statig::prelude::*;
use tracing::debug;

use crate::form::SessionState;
use crate::runtime::{ActorHandle, ActorId, ActorKind, FieldEvent};

/// Notifications emitted by a session reducer within one dispatch step.
pub type SessionOutbox = Vec<SessionState>;

/// One clinical session tab. The entry decision between `viewing` and
/// `editing` is made once, from the `editable` flag, when the spawner
/// dispatches `Init`; it is never re-evaluated afterwards. Replacing an
/// actor's editability requires respawning it.
pub struct SessionMachine {
    pub(crate) editable: bool,
    pub(crate) form: SessionState,
}

#[state_machine(
    initial = "State::deciding()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl SessionMachine {
    #[state]
    fn deciding(&mut self, context: &mut SessionOutbox, event: &FieldEvent) -> Response<State> {
        let _ = context;
        match event {
            FieldEvent::Init if self.editable => Transition(State::editing()),
            FieldEvent::Init => Transition(State::viewing()),
            _ => Handled,
        }
    }

    /// Read-only for the life of the actor: mutation events are ignored and
    /// produce no parent notification.
    #[state]
    fn viewing(&mut self, context: &mut SessionOutbox, event: &FieldEvent) -> Response<State> {
        let _ = (context, event);
        Handled
    }

    #[state]
    fn editing(&mut self, context: &mut SessionOutbox, event: &FieldEvent) -> Response<State> {
        match event {
            FieldEvent::UpdateField { key, value } => {
                self.form.apply_field(key, value.clone());
                context.push(self.form.clone());
                Handled
            }
            FieldEvent::SetData { data } => {
                self.form = SessionState::from_data(data);
                context.push(self.form.clone());
                Handled
            }
            FieldEvent::Init => Handled,
        }
    }
}

/// A spawned session actor: handle plus running machine.
pub struct SessionActor {
    handle: ActorHandle,
    machine: StateMachine<SessionMachine>,
}

impl SessionActor {
    /// Spawn a session at `index`, seeded from any previously reported state.
    /// Returns the actor together with its initial state snapshot.
    pub fn spawn(index: u32, seed: Option<&SessionState>, editable: bool) -> (Self, SessionState) {
        let id = ActorId::session(index);
        let form = seed.cloned().unwrap_or_default();
        let snapshot = form.clone();
        let mut machine = SessionMachine { editable, form }.state_machine();
        let mut outbox = SessionOutbox::new();
        machine.handle_with_context(&FieldEvent::Init, &mut outbox);
        debug!(actor = %id, editable, "session actor spawned");
        (
            Self {
                handle: ActorHandle::new(id, ActorKind::Session),
                machine,
            },
            snapshot,
        )
    }

    /// Run one reducer step. Returns the full updated state when the event
    /// mutated anything; `None` means no change and no parent notification.
    pub fn handle(&mut self, event: &FieldEvent) -> Option<SessionState> {
        let mut outbox = SessionOutbox::new();
        self.machine.handle_with_context(event, &mut outbox);
        outbox.pop()
    }

    pub fn handle_ref(&self) -> &ActorHandle {
        &self.handle
    }

    pub fn id(&self) -> &ActorId {
        &self.handle.id
    }

    pub fn is_editable(&self) -> bool {
        *self.machine.state() == State::editing()
    }

    pub fn form(&self) -> &SessionState {
        &self.machine.form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn editable_session_merges_and_notifies() {
        let (mut actor, _) = SessionActor::spawn(1, None, true);
        assert!(actor.is_editable());

        let reported = actor
            .handle(&FieldEvent::update("date", json!("2026-01-05")))
            .expect("editable session reports every mutation");
        assert_eq!(reported.date.as_deref(), Some("2026-01-05"));
        assert_eq!(actor.form().date.as_deref(), Some("2026-01-05"));
    }

    #[test]
    fn read_only_session_ignores_mutations() {
        let mut seed = SessionState::default();
        seed.session_number = Some(2);
        let (mut actor, snapshot) = SessionActor::spawn(2, Some(&seed), false);
        assert!(!actor.is_editable());
        assert_eq!(snapshot.session_number, Some(2));

        assert!(actor
            .handle(&FieldEvent::update("date", json!("2026-01-05")))
            .is_none());
        assert!(actor
            .handle(&FieldEvent::SetData { data: json!({}) })
            .is_none());
        assert_eq!(actor.form().session_number, Some(2));
    }

    #[test]
    fn set_data_replaces_with_defaults_merged() {
        let (mut actor, _) = SessionActor::spawn(1, None, true);
        actor.handle(&FieldEvent::update("gad_notes", json!("will be dropped")));

        let reported = actor
            .handle(&FieldEvent::SetData {
                data: json!({ "session_number": 4 }),
            })
            .unwrap();
        assert_eq!(reported.session_number, Some(4));
        assert_eq!(reported.gad_notes, "");
    }
}
