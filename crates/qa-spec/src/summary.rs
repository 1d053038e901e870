use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// Question id to resolved value, the payload handed to the script renderer.
pub type FlatAnswers = BTreeMap<String, String>;

/// One visible line of the summary screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryEntry {
    pub question_id: String,
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
}

impl Summary {
    pub fn get(&self, question_id: &str) -> Option<&SummaryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.question_id == question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applicable questions with their effective values; skipped questions are
/// left out entirely.
pub fn summarize(state: &SessionState) -> Summary {
    let entries = state
        .answers()
        .iter()
        .enumerate()
        .filter(|(position, _)| state.is_applicable(*position))
        .map(|(_, answer)| SummaryEntry {
            question_id: answer.question().id.clone(),
            text: answer.question().text.clone(),
            value: answer.effective_value().to_string(),
        })
        .collect();
    Summary { entries }
}

/// Every question id mapped to its effective value, or to its default when
/// the question is skipped, whatever was typed into it before.
pub fn flatten(state: &SessionState) -> FlatAnswers {
    state
        .answers()
        .iter()
        .enumerate()
        .map(|(position, answer)| {
            let value = if state.is_applicable(position) {
                answer.effective_value()
            } else {
                answer.question().default.as_str()
            };
            (answer.question().id.clone(), value.to_string())
        })
        .collect()
}
