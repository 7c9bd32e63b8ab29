//! Conversions between the persisted document's human-readable GAD-7 field
//! and the typed survey state.
//!
//! The stored field keeps question and answer text so the document stays
//! legible on its own; loading maps answer text back to codes and drops
//! anything it no longer recognizes.

use serde_json::{json, Map, Value};

use crate::catalog;
use crate::form::SurveyState;

/// Path of the survey field inside the persisted document.
pub const GAD_FIELD_POINTER: &str = "/fields/behavioral_health_gad";

/// Render the survey state as the document's readable field: question/answer
/// text keyed by question number, plus the derived score and severity.
pub fn gad_field(state: &SurveyState) -> Value {
    let mut survey = Map::new();
    for (question, code) in &state.answers {
        survey.insert(
            question.to_string(),
            json!({
                "question": catalog::question_text(*question).unwrap_or_default(),
                "answer": catalog::answer_text(*code).unwrap_or_default(),
            }),
        );
    }
    json!({
        "survey": survey,
        "score": state.score,
        "severity": state.severity,
        "how_difficult": state.how_difficult,
    })
}

/// Recover the survey state from a persisted document, or `None` when the
/// document carries no survey field.
pub fn survey_from_document(document: &Value) -> Option<SurveyState> {
    let field = document.pointer(GAD_FIELD_POINTER)?;
    let mut state = SurveyState::default();

    if let Some(entries) = field.get("survey").and_then(Value::as_object) {
        for (key, entry) in entries {
            let Ok(question) = key.parse::<u8>() else {
                continue;
            };
            let Some(code) = entry
                .get("answer")
                .and_then(Value::as_str)
                .and_then(catalog::answer_code)
            else {
                continue;
            };
            state.answers.insert(question, code);
        }
    }
    state.how_difficult = field
        .get("how_difficult")
        .and_then(Value::as_str)
        .map(str::to_string);
    state.recompute();
    Some(state)
}
