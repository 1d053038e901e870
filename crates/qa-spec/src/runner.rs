use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::QuestionnaireError;
use crate::session::SessionState;
use crate::spec::question::Question;

/// Session driven to the summary from a prepared set of answers.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub state: SessionState,
    pub warnings: Vec<String>,
}

/// Walks a fresh session forward, recording the supplied answer for every
/// question the cursor lands on, until the summary is reached.
pub fn replay(
    questions: Vec<Question>,
    answers: &BTreeMap<String, String>,
) -> Result<ReplayOutcome, QuestionnaireError> {
    let mut state = SessionState::initialize(questions)?;

    while let Some(question) = state.current_question() {
        state = match answers.get(&question.id) {
            Some(value) => state.change(value.clone()).next(),
            None => state.next(),
        };
    }

    let mut warnings = Vec::new();
    for id in answers.keys() {
        match state.answer(id) {
            None => warnings.push(format!("answer for unknown question '{}' ignored", id)),
            Some(answer) if !state.should_ask(answer.question())? => {
                warnings.push(format!("answer for skipped question '{}' ignored", id))
            }
            Some(_) => {}
        }
    }
    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(ReplayOutcome { state, warnings })
}

/// Converts a JSON object of answers into string values; numbers and
/// booleans are rendered with their JSON text, `null` means unset.
pub fn answers_from_value(value: &Value) -> Result<BTreeMap<String, String>, QuestionnaireError> {
    let object = value
        .as_object()
        .ok_or(QuestionnaireError::InvalidAnswers)?;
    let mut answers = BTreeMap::new();
    for (id, value) in object {
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Null => continue,
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            _ => return Err(QuestionnaireError::InvalidAnswers),
        };
        answers.insert(id.clone(), text);
    }
    Ok(answers)
}
