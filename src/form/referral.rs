use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;
use crate::catalog::ReasonTemplate;

/// One referral record. Unclassified until `primary_reason` is non-empty;
/// classification overlays the reason's template sub-objects while keeping
/// `referral_date` verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralState {
    pub primary_reason: String,
    pub referral_date: Option<String>,
    pub notes: serde_json::Map<String, Value>,
    pub patient_referred: serde_json::Map<String, Value>,
    pub chief_complaint: serde_json::Map<String, Value>,
    pub callback: serde_json::Map<String, Value>,
    pub other_details: String,
    pub complaint: String,
    pub callback_date: Option<String>,
    pub notes_value: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ReferralState {
    pub fn is_classified(&self) -> bool {
        !self.primary_reason.is_empty()
    }

    /// Plain keyed assignment for everything except `primary_reason`, which
    /// must go through [`ReferralState::reclassify`].
    pub fn apply_field(&mut self, key: &str, value: Value) {
        match key {
            "referral_date" => self.referral_date = fields::as_opt_string(&value),
            "notes" => self.notes = fields::as_object(&value),
            "patient_referred" => self.patient_referred = fields::as_object(&value),
            "chief_complaint" => self.chief_complaint = fields::as_object(&value),
            "callback" => self.callback = fields::as_object(&value),
            "other_details" => self.other_details = fields::as_string(&value),
            "complaint" => self.complaint = fields::as_string(&value),
            "callback_date" => self.callback_date = fields::as_opt_string(&value),
            "notes_value" => self.notes_value = fields::as_string(&value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// Rebuild the record for a new reason: defaults, then the reason's
    /// template overlay. `referral_date` survives any reclassification.
    pub fn reclassify(&mut self, reason: &str, template: Option<&ReasonTemplate>) {
        let preserved_date = self.referral_date.take();
        *self = Self::default();
        self.primary_reason = reason.to_string();
        self.referral_date = preserved_date;
        if let Some(template) = template {
            if let Some(notes) = &template.notes {
                self.notes = notes.clone();
            }
            if let Some(patient_referred) = &template.patient_referred {
                self.patient_referred = patient_referred.clone();
            }
            if let Some(chief_complaint) = &template.chief_complaint {
                self.chief_complaint = chief_complaint.clone();
            }
            if let Some(callback) = &template.callback {
                self.callback = callback.clone();
            }
        }
    }

    pub fn from_data(data: &Value) -> Self {
        serde_json::from_value(data.clone()).unwrap_or_default()
    }
}
