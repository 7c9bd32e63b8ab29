use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ReferralState, SessionState, SurveyState};
use crate::runtime::{ActorId, ChildState, Notification};

/// Aggregate form state: each child actor's last-reported state, keyed by
/// actor id. Owned exclusively by the orchestrator and mutated only by
/// merging child notifications; no reducer ever reaches into another actor's
/// memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub session_count: u32,
    pub entries: BTreeMap<ActorId, ChildState>,
}

impl FormState {
    /// Overwrite one child's entry with its freshly reported state.
    pub fn merge(&mut self, notification: &Notification) {
        self.entries
            .insert(notification.from.clone(), notification.data.clone());
    }

    pub fn remove(&mut self, id: &ActorId) {
        self.entries.remove(id);
    }

    /// Survey-need predicate: true iff any session requests the screening
    /// survey.
    pub fn survey_needed(&self) -> bool {
        self.entries.values().any(|entry| match entry {
            ChildState::Session(session) => session.requests_survey(),
            _ => false,
        })
    }

    pub fn session(&self, index: u32) -> Option<&SessionState> {
        match self.entries.get(&ActorId::session(index)) {
            Some(ChildState::Session(session)) => Some(session),
            _ => None,
        }
    }

    pub fn survey(&self) -> Option<&SurveyState> {
        match self.entries.get(&ActorId::survey()) {
            Some(ChildState::Survey(survey)) => Some(survey),
            _ => None,
        }
    }

    pub fn referrals(&self) -> &[ReferralState] {
        match self.entries.get(&ActorId::referrals()) {
            Some(ChildState::Referrals(referrals)) => referrals,
            _ => &[],
        }
    }
}
