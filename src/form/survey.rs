use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::fields;

/// Coarse classification of a GAD-7 score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    #[serde(rename = "Minimal Anxiety")]
    Minimal,
    #[serde(rename = "Mild Anxiety")]
    Mild,
    #[serde(rename = "Moderate Anxiety")]
    Moderate,
    #[serde(rename = "Severe Anxiety")]
    Severe,
}

impl Severity {
    pub fn for_score(score: i64) -> Self {
        if score < 5 {
            Severity::Minimal
        } else if score < 10 {
            Severity::Mild
        } else if score < 15 {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minimal => "Minimal Anxiety",
            Severity::Mild => "Mild Anxiety",
            Severity::Moderate => "Moderate Anxiety",
            Severity::Severe => "Severe Anxiety",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Minimal Anxiety" => Ok(Severity::Minimal),
            "Mild Anxiety" => Ok(Severity::Mild),
            "Moderate Anxiety" => Ok(Severity::Moderate),
            "Severe Anxiety" => Ok(Severity::Severe),
            _ => Err(()),
        }
    }
}

/// GAD-7 screening instrument state. `score` and `severity` are derived from
/// `answers` on every mutation; `score == answers.values().sum()` always
/// holds after a reducer step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyState {
    /// Question number -> answer code 0..3.
    #[serde(rename = "survey")]
    pub answers: BTreeMap<u8, i64>,
    pub score: i64,
    pub severity: Severity,
    pub how_difficult: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SurveyState {
    /// Defaults merged with a JSON object; recomputes the derived score and
    /// severity when the replacement carries answers.
    pub fn from_data(data: &Value) -> Self {
        let mut state = Self::default();
        if let Some(object) = data.as_object() {
            for (key, value) in object {
                state.apply_field(key, value.clone());
            }
        }
        state
    }

    pub fn apply_field(&mut self, key: &str, value: Value) {
        match key {
            "survey" | "answers" => self.set_answers(&value),
            "how_difficult" => self.how_difficult = fields::as_opt_string(&value),
            // Stored score/severity are accepted but immediately re-derived
            // the next time answers change.
            "score" => self.score = fields::coerce_code(&value),
            "severity" => {
                if let Some(label) = value.as_str() {
                    if let Ok(severity) = label.parse() {
                        self.severity = severity;
                    }
                }
            }
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// Replace the answer mapping and recompute score/severity. Question
    /// keys that are not small integers are skipped; answer codes that are
    /// not numeric coerce to zero.
    pub fn set_answers(&mut self, value: &Value) {
        let mut answers = BTreeMap::new();
        if let Some(object) = value.as_object() {
            for (key, code) in object {
                let Ok(question) = key.parse::<u8>() else {
                    continue;
                };
                answers.insert(question, fields::coerce_code(code));
            }
        }
        self.answers = answers;
        self.recompute();
    }

    pub fn recompute(&mut self) {
        self.score = self.answers.values().sum();
        self.severity = Severity::for_score(self.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_thresholds() {
        assert_eq!(Severity::for_score(0), Severity::Minimal);
        assert_eq!(Severity::for_score(4), Severity::Minimal);
        assert_eq!(Severity::for_score(5), Severity::Mild);
        assert_eq!(Severity::for_score(9), Severity::Mild);
        assert_eq!(Severity::for_score(10), Severity::Moderate);
        assert_eq!(Severity::for_score(14), Severity::Moderate);
        assert_eq!(Severity::for_score(15), Severity::Severe);
        assert_eq!(Severity::for_score(21), Severity::Severe);
    }

    #[test]
    fn score_is_sum_of_coerced_codes() {
        let mut state = SurveyState::default();
        state.set_answers(&json!({
            "1": 3,
            "2": "2",
            "3": "bogus",
            "4": null,
            "not-a-question": 3
        }));
        assert_eq!(state.score, 5);
        assert_eq!(state.severity, Severity::Mild);
        assert_eq!(state.answers.len(), 4);
        assert_eq!(state.answers[&3], 0);
    }

    #[test]
    fn severity_round_trips_through_labels() {
        for severity in [
            Severity::Minimal,
            Severity::Mild,
            Severity::Moderate,
            Severity::Severe,
        ] {
            assert_eq!(severity.label().parse::<Severity>(), Ok(severity));
        }
        assert!("Unknown".parse::<Severity>().is_err());
    }
}
