use std::sync::Arc;
use tracing::{debug, warn};

use super::referral::ReferralActor;
use crate::catalog::ReasonCatalog;
use crate::form::ReferralState;
use crate::runtime::{ActorHandle, ActorId, ActorKind, ChildState, FieldEvent, Notification};

/// Commands accepted by the referral collection. Referrals are addressed by
/// position; positions shift down after a removal.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferralCommand {
    /// Spawn a new referral actor at the next position.
    Add,
    /// Stop and remove the referral at `index`.
    Remove { index: usize },
    /// Overwrite the state entry at `index` (a child's change report).
    Updated { index: usize, data: ReferralState },
    /// Route a field event to the referral actor at `index`.
    Field { index: usize, event: FieldEvent },
}

/// One position in the collection: the child's handle, its running machine,
/// and its last-reported state live in the same slot, so the handle list and
/// the state list can never desynchronize.
struct ReferralSlot {
    actor: ReferralActor,
    state: ReferralState,
}

/// Owns the ordered set of referral actors. Single state (`managing`) for
/// its whole lifetime; every accepted change is re-broadcast upward as the
/// full collection.
pub struct ReferralCollection {
    handle: ActorHandle,
    slots: Vec<ReferralSlot>,
    next_serial: u64,
    catalog: Arc<dyn ReasonCatalog>,
}

impl ReferralCollection {
    /// Spawn the collection, recreating one referral actor per seeded state.
    pub fn spawn(seed: &[ReferralState], catalog: Arc<dyn ReasonCatalog>) -> Self {
        let mut collection = Self {
            handle: ActorHandle::new(ActorId::referrals(), ActorKind::ReferralCollection),
            slots: Vec::new(),
            next_serial: 0,
            catalog,
        };
        for state in seed {
            collection.push_slot(state.clone());
        }
        collection
    }

    fn push_slot(&mut self, state: ReferralState) {
        let serial = self.next_serial;
        self.next_serial += 1;
        let actor = ReferralActor::spawn(serial, state.clone(), Arc::clone(&self.catalog));
        self.slots.push(ReferralSlot { actor, state });
    }

    /// Run one reducer step. Returns the collection notification to forward
    /// to the orchestrator, or `None` when nothing changed (adds are silent,
    /// matching the original reducer; out-of-range commands are no-ops).
    pub fn handle(&mut self, command: &ReferralCommand) -> Option<Notification> {
        match command {
            ReferralCommand::Add => {
                let index = self.slots.len();
                self.push_slot(ReferralState::default());
                debug!(index, "referral added");
                None
            }
            ReferralCommand::Remove { index } => {
                if *index >= self.slots.len() {
                    warn!(index, len = self.slots.len(), "remove for out-of-range referral ignored");
                    return None;
                }
                let slot = self.slots.remove(*index);
                debug!(index, actor = %slot.actor.handle_ref().id, "referral stopped and removed");
                Some(self.notification())
            }
            ReferralCommand::Updated { index, data } => {
                let Some(slot) = self.slots.get_mut(*index) else {
                    warn!(index, len = self.slots.len(), "update for out-of-range referral ignored");
                    return None;
                };
                slot.state = data.clone();
                Some(self.notification())
            }
            ReferralCommand::Field { index, event } => {
                let Some(slot) = self.slots.get_mut(*index) else {
                    warn!(index, len = self.slots.len(), "field event for out-of-range referral ignored");
                    return None;
                };
                let reported = slot.actor.handle(event)?;
                slot.state = reported;
                Some(self.notification())
            }
        }
    }

    fn notification(&self) -> Notification {
        Notification {
            from: self.handle.id.clone(),
            data: ChildState::Referrals(self.states()),
        }
    }

    pub fn handle_ref(&self) -> &ActorHandle {
        &self.handle
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value copy of every referral's last-reported state, in display order.
    pub fn states(&self) -> Vec<ReferralState> {
        self.slots.iter().map(|slot| slot.state.clone()).collect()
    }

    pub fn child_handles(&self) -> Vec<ActorHandle> {
        self.slots
            .iter()
            .map(|slot| slot.actor.handle_ref().clone())
            .collect()
    }
}
