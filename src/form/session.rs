use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;

/// One clinical session record. Whether the record accepts field updates is
/// decided by the session actor at spawn time, not stored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub date: Option<String>,
    pub session_number: Option<i64>,
    pub appointment_duration: Option<i64>,
    pub reason_or_stressors: String,
    pub patient_presentation: String,
    pub interventions_discussed: Vec<String>,
    pub other_details: String,
    pub techniques_used: String,
    pub patient_response: String,
    pub progress_and_outcomes: String,
    /// Request-survey flag; the orchestrator's survey-need predicate is true
    /// iff any session has this set.
    pub update_gad: Option<bool>,
    pub gad_notes: String,
    pub reported_suicidal_thoughts: Option<bool>,
    pub stanley_brown_notes: String,
    pub homework_assignments: String,
    pub next_session_plan: String,
    pub additional_notes: String,
    /// Free-text keys outside the fixed field set.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SessionState {
    /// Defaults merged with a JSON object, for `setData` and seeding.
    pub fn from_data(data: &Value) -> Self {
        let mut state = Self::default();
        if let Some(object) = data.as_object() {
            for (key, value) in object {
                state.apply_field(key, value.clone());
            }
        }
        state
    }

    /// Merge a single keyed value. Unknown keys land in `extra`.
    pub fn apply_field(&mut self, key: &str, value: Value) {
        match key {
            "date" => self.date = fields::as_opt_string(&value),
            "session_number" => self.session_number = fields::as_opt_i64(&value),
            "appointment_duration" => self.appointment_duration = fields::as_opt_i64(&value),
            "reason_or_stressors" => self.reason_or_stressors = fields::as_string(&value),
            "patient_presentation" => self.patient_presentation = fields::as_string(&value),
            "interventions_discussed" => {
                self.interventions_discussed = fields::as_string_list(&value)
            }
            "other_details" => self.other_details = fields::as_string(&value),
            "techniques_used" => self.techniques_used = fields::as_string(&value),
            "patient_response" => self.patient_response = fields::as_string(&value),
            "progress_and_outcomes" => self.progress_and_outcomes = fields::as_string(&value),
            "update_gad" => self.update_gad = fields::as_opt_bool(&value),
            "gad_notes" => self.gad_notes = fields::as_string(&value),
            "reported_suicidal_thoughts" => {
                self.reported_suicidal_thoughts = fields::as_opt_bool(&value)
            }
            "stanley_brown_notes" => self.stanley_brown_notes = fields::as_string(&value),
            "homework_assignments" => self.homework_assignments = fields::as_string(&value),
            "next_session_plan" => self.next_session_plan = fields::as_string(&value),
            "additional_notes" => self.additional_notes = fields::as_string(&value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    pub fn requests_survey(&self) -> bool {
        self.update_gad == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_data_merges_over_defaults() {
        let state = SessionState::from_data(&json!({
            "date": "2026-02-11",
            "update_gad": true,
            "custom_note": "kept"
        }));
        assert_eq!(state.date.as_deref(), Some("2026-02-11"));
        assert!(state.requests_survey());
        assert_eq!(state.extra["custom_note"], json!("kept"));
        assert_eq!(state.reason_or_stressors, "");
    }

    #[test]
    fn apply_field_overwrites_one_key() {
        let mut state = SessionState::default();
        state.apply_field("techniques_used", json!("breathing exercises"));
        assert_eq!(state.techniques_used, "breathing exercises");
        state.apply_field("update_gad", json!(false));
        assert_eq!(state.update_gad, Some(false));
        assert!(!state.requests_survey());
    }
}
