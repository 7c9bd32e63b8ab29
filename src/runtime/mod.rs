// Actor runtime primitives - identity, handles, and the upward
// notification protocol shared by every machine in the form tree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::form::{ReferralState, SessionState, SurveyState};

/// Logical identifier of a spawned actor (`session-3`, `gad`, `referrals`,
/// `referral-7`). Ids are allocated by the spawner and never reused within
/// one orchestrator lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn session(index: u32) -> Self {
        Self(format!("session-{index}"))
    }

    pub fn survey() -> Self {
        Self("gad".to_string())
    }

    pub fn referrals() -> Self {
        Self("referrals".to_string())
    }

    /// Referral ids carry a spawn serial, not a position. The position of a
    /// referral is derived from its slot in the collection.
    pub fn referral(serial: u64) -> Self {
        Self(format!("referral-{serial}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Session,
    Survey,
    ReferralCollection,
    Referral,
}

/// Opaque reference to a running child, owned by whichever actor spawned it.
/// A handle is destroyed exactly once when its actor is stopped; events
/// addressed to a stopped id are silently dropped by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorHandle {
    pub id: ActorId,
    pub kind: ActorKind,
}

impl ActorHandle {
    pub fn new(id: ActorId, kind: ActorKind) -> Self {
        Self { id, kind }
    }
}

/// Value-copied snapshot of one child's state, as reported upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state")]
pub enum ChildState {
    Session(SessionState),
    Survey(SurveyState),
    Referrals(Vec<ReferralState>),
}

/// Upward message from a child to its parent carrying the child's full
/// latest state by value. Children never hold references into parent state;
/// this is the only channel between the two.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub from: ActorId,
    pub data: ChildState,
}

/// Events accepted by the leaf form actors (session, survey, referral).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    /// Dispatched exactly once by the spawner, immediately after
    /// construction, to settle the entry state. Never delivered again.
    Init,
    /// Merge a single keyed value into the actor's state.
    UpdateField {
        key: String,
        value: serde_json::Value,
    },
    /// Wholesale replacement: defaults merged with `data`.
    SetData { data: serde_json::Value },
}

impl FieldEvent {
    pub fn update(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::UpdateField {
            key: key.into(),
            value,
        }
    }
}
