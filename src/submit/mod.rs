//! One-shot asynchronous submission: payload transform, transport
//! abstraction, and the simulated transport used outside of tests.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::ReasonCatalog;
use crate::form::fields;
use crate::form::FormState;
use crate::persist::document;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub fields: PayloadFields,
    pub action: PayloadAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadFields {
    /// Human-readable question/answer listing, present when the survey was
    /// part of the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavioral_health_gad: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadAction {
    /// Flat list of referral classification reasons, in display order.
    pub referrals: Vec<String>,
    /// Callback date from the first referral whose reason requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_date: Option<String>,
}

/// Pure transform from a FormState snapshot to the submission payload.
pub fn build_payload(snapshot: &FormState, catalog: &dyn ReasonCatalog) -> SubmissionPayload {
    let behavioral_health_gad = snapshot.survey().map(document::gad_field);

    let referrals: Vec<String> = snapshot
        .referrals()
        .iter()
        .map(|referral| referral.primary_reason.clone())
        .collect();

    let callback_date = snapshot
        .referrals()
        .iter()
        .find(|referral| catalog.requires_callback(&referral.primary_reason))
        .and_then(|referral| referral.callback.get("date"))
        .and_then(|date| fields::as_opt_string(date));

    SubmissionPayload {
        fields: PayloadFields {
            behavioral_health_gad,
        },
        action: PayloadAction {
            referrals,
            callback_date,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Submission failed: {message}")]
    Transport { message: String },
}

/// Asynchronous transport for the submission payload. Injectable so tests
/// can force either outcome deterministically; implementations resolve
/// exactly once per call and never retry internally.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Simulated network transport with a fixed success probability.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedTransport {
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        // The original simulation succeeded 4 times out of 5.
        Self::new(0.8, Duration::from_millis(250))
    }
}

#[async_trait]
impl SubmissionTransport for SimulatedTransport {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError> {
        debug!(referrals = payload.action.referrals.len(), "delivering submission");
        tokio::time::sleep(self.latency).await;
        let roll: f64 = rand::rng().random();
        if roll < self.success_rate {
            let receipt = SubmissionReceipt {
                id: format!("FORM-{}", Utc::now().timestamp_millis()),
            };
            info!(receipt = %receipt.id, "submission delivered");
            Ok(receipt)
        } else {
            warn!("simulated transport failure");
            Err(SubmissionError::Transport {
                message: "network error occurred".to_string(),
            })
        }
    }
}

/// Deterministic transport: plays back a scripted sequence of outcomes, then
/// keeps returning the final default.
#[derive(Debug)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<bool>>,
    default: bool,
}

impl ScriptedTransport {
    pub fn new(outcomes: impl IntoIterator<Item = bool>, default: bool) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            default,
        }
    }

    pub fn succeeding() -> Self {
        Self::new([], true)
    }

    pub fn failing() -> Self {
        Self::new([], false)
    }
}

#[async_trait]
impl SubmissionTransport for ScriptedTransport {
    async fn deliver(&self, _payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError> {
        let succeed = self
            .outcomes
            .lock()
            .map(|mut outcomes| outcomes.pop_front().unwrap_or(self.default))
            .unwrap_or(self.default);
        if succeed {
            Ok(SubmissionReceipt {
                id: format!("FORM-{}", Utc::now().timestamp_millis()),
            })
        } else {
            Err(SubmissionError::Transport {
                message: "network error occurred".to_string(),
            })
        }
    }
}
