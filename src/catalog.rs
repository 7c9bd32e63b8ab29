//! Static reference data supplied from outside the actor core: the referral
//! reason catalog and the GAD-7 question/answer text tables.

use serde_json::{json, Value};

/// Default sub-objects applied to a referral when it is classified under a
/// given reason code. Absent members leave the record's sub-object empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasonTemplate {
    pub notes: Option<serde_json::Map<String, Value>>,
    pub patient_referred: Option<serde_json::Map<String, Value>>,
    pub chief_complaint: Option<serde_json::Map<String, Value>>,
    pub callback: Option<serde_json::Map<String, Value>>,
}

/// Pure lookup of reason templates. Supplied externally; the actor core only
/// ever reads from it.
pub trait ReasonCatalog: Send + Sync {
    fn template(&self, reason: &str) -> Option<ReasonTemplate>;

    /// Whether referrals under this reason carry a callback whose date is
    /// surfaced on the submission payload.
    fn requires_callback(&self, reason: &str) -> bool;
}

/// Built-in catalog used by the binary and tests.
#[derive(Debug, Clone)]
pub struct StaticReasonCatalog {
    callback_reason: String,
}

impl Default for StaticReasonCatalog {
    fn default() -> Self {
        Self {
            callback_reason: "FlexCare".to_string(),
        }
    }
}

impl StaticReasonCatalog {
    pub fn new(callback_reason: impl Into<String>) -> Self {
        Self {
            callback_reason: callback_reason.into(),
        }
    }
}

fn object(value: Value) -> Option<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

impl ReasonCatalog for StaticReasonCatalog {
    fn template(&self, reason: &str) -> Option<ReasonTemplate> {
        match reason {
            "FlexCare" => Some(ReasonTemplate {
                callback: object(json!({ "date": null, "phone": "" })),
                notes: object(json!({ "value": "" })),
                ..ReasonTemplate::default()
            }),
            "Therapy" => Some(ReasonTemplate {
                patient_referred: object(json!({ "provider": "", "accepted": null })),
                notes: object(json!({ "value": "" })),
                ..ReasonTemplate::default()
            }),
            "Psychiatry" => Some(ReasonTemplate {
                patient_referred: object(json!({ "provider": "", "accepted": null })),
                chief_complaint: object(json!({ "value": "" })),
                ..ReasonTemplate::default()
            }),
            "Primary Care" => Some(ReasonTemplate {
                chief_complaint: object(json!({ "value": "" })),
                ..ReasonTemplate::default()
            }),
            "Other" => Some(ReasonTemplate {
                notes: object(json!({ "value": "" })),
                ..ReasonTemplate::default()
            }),
            _ => None,
        }
    }

    fn requires_callback(&self, reason: &str) -> bool {
        reason == self.callback_reason
    }
}

/// GAD-7 question text, indexed by question number 1..=7.
pub const GAD7_QUESTIONS: [&str; 7] = [
    "Feeling nervous, anxious, or on edge",
    "Not being able to stop or control worrying",
    "Worrying too much about different things",
    "Trouble relaxing",
    "Being so restless that it is hard to sit still",
    "Becoming easily annoyed or irritable",
    "Feeling afraid, as if something awful might happen",
];

/// GAD-7 answer text, indexed by answer code 0..=3.
pub const GAD7_ANSWERS: [&str; 4] = [
    "Not at all",
    "Several days",
    "More than half the days",
    "Nearly every day",
];

pub fn question_text(number: u8) -> Option<&'static str> {
    (1..=7)
        .contains(&number)
        .then(|| GAD7_QUESTIONS[usize::from(number) - 1])
}

pub fn answer_text(code: i64) -> Option<&'static str> {
    usize::try_from(code).ok().and_then(|i| GAD7_ANSWERS.get(i)).copied()
}

pub fn answer_code(text: &str) -> Option<i64> {
    GAD7_ANSWERS
        .iter()
        .position(|answer| *answer == text)
        .map(|i| i as i64)
}
