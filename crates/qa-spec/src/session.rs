use std::collections::HashMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuestionnaireError;
use crate::spec::question::Question;
use crate::summary::{FlatAnswers, Summary, flatten, summarize};
use crate::validate::validate_questions;

/// The user's answer to one question, paired with the question it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    question: Arc<Question>,
    value: String,
}

impl Answer {
    fn unset(question: Arc<Question>) -> Self {
        Self {
            question,
            value: String::new(),
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Raw input; empty means the user has not set it.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }

    /// The typed value when present, otherwise the question default.
    pub fn effective_value(&self) -> &str {
        if self.value.is_empty() {
            &self.question.default
        } else {
            &self.value
        }
    }
}

/// Where the cursor of a session points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Asking(usize),
    Summary,
}

/// Serializable cursor and raw values, used to carry a session between
/// stateless calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionSnapshot {
    pub current_index: usize,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug)]
struct QuestionIndex {
    positions: HashMap<String, usize>,
    dependencies: Vec<Option<usize>>,
}

impl QuestionIndex {
    fn build(answers: &[Answer]) -> Self {
        let positions = answers
            .iter()
            .enumerate()
            .map(|(position, answer)| (answer.question.id.clone(), position))
            .collect::<HashMap<_, _>>();
        let dependencies = answers
            .iter()
            .map(|answer| {
                answer
                    .question
                    .ask_when
                    .as_ref()
                    .and_then(|ask_when| positions.get(&ask_when.depends_on_question_id))
                    .copied()
            })
            .collect();
        Self {
            positions,
            dependencies,
        }
    }
}

/// In-memory state of one questionnaire visit.
///
/// Transitions never mutate a state; they return a new one that shares the
/// question definitions and copies the answer slice on write.
#[derive(Debug, Clone)]
pub struct SessionState {
    index: Arc<QuestionIndex>,
    answers: Arc<[Answer]>,
    current_index: usize,
}

impl SessionState {
    /// Starts a session at the first question, or at the summary when the
    /// list is empty.
    pub fn initialize(questions: Vec<Question>) -> Result<Self, QuestionnaireError> {
        let report = validate_questions(&questions);
        if !report.valid {
            return Err(QuestionnaireError::InvalidConfiguration(report));
        }

        let answers = questions
            .into_iter()
            .map(|question| Answer::unset(Arc::new(question)))
            .collect::<Vec<_>>();
        let index = QuestionIndex::build(&answers);
        debug!(questions = answers.len(), "questionnaire session initialized");
        Ok(Self {
            index: Arc::new(index),
            answers: answers.into(),
            current_index: 0,
        })
    }

    /// Rebuilds a session from a snapshot taken against the same questions.
    ///
    /// A cursor resting on a question that is no longer applicable is moved
    /// forward to the next applicable one.
    pub fn restore(
        questions: Vec<Question>,
        snapshot: &SessionSnapshot,
    ) -> Result<Self, QuestionnaireError> {
        let length = questions.len();
        if snapshot.values.len() != length {
            return Err(QuestionnaireError::SnapshotMismatch {
                expected: length,
                found: snapshot.values.len(),
            });
        }
        if snapshot.current_index > length {
            return Err(QuestionnaireError::CursorOutOfRange {
                cursor: snapshot.current_index,
                length,
            });
        }

        let fresh = Self::initialize(questions)?;
        let answers = fresh
            .answers
            .iter()
            .zip(&snapshot.values)
            .map(|(answer, value)| Answer {
                question: Arc::clone(&answer.question),
                value: value.clone(),
            })
            .collect::<Vec<_>>();
        let mut state = Self {
            answers: answers.into(),
            current_index: snapshot.current_index,
            ..fresh
        };
        if state.current_index < length && !state.is_applicable(state.current_index) {
            state.current_index = state.scan_forward(state.current_index);
        }
        Ok(state)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            values: self
                .answers
                .iter()
                .map(|answer| answer.value.clone())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn position(&self) -> Position {
        if self.is_summary() {
            Position::Summary
        } else {
            Position::Asking(self.current_index)
        }
    }

    pub fn is_summary(&self) -> bool {
        self.current_index >= self.answers.len()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.index
            .positions
            .get(question_id)
            .map(|&position| &self.answers[position])
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.answers.iter().map(Answer::question)
    }

    /// Answer slot under the cursor; `None` in summary mode.
    pub fn current(&self) -> Option<&Answer> {
        self.answers.get(self.current_index)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current().map(Answer::question)
    }

    /// Whether `question` should be presented given the answers so far.
    ///
    /// The dependency is looked up by id, so any question carrying a
    /// condition can be checked, not only the ones owned by this session.
    pub fn should_ask(&self, question: &Question) -> Result<bool, QuestionnaireError> {
        let Some(ask_when) = &question.ask_when else {
            return Ok(true);
        };
        let dependency = self
            .index
            .positions
            .get(&ask_when.depends_on_question_id)
            .copied()
            .ok_or_else(|| QuestionnaireError::UnknownDependency {
                question: question.id.clone(),
                depends_on: ask_when.depends_on_question_id.clone(),
            })?;
        Ok(self.condition_holds(dependency, &ask_when.equals_value))
    }

    /// Records `value` for the question under the cursor.
    pub fn change(&self, value: impl Into<String>) -> Self {
        let Some(current) = self.current() else {
            debug!("change ignored while showing the summary");
            return self.clone();
        };

        let value = value.into();
        debug!(question = %current.question.id, "recorded answer");
        let mut answers = self.answers.to_vec();
        answers[self.current_index] = Answer {
            question: Arc::clone(&current.question),
            value,
        };
        Self {
            index: Arc::clone(&self.index),
            answers: answers.into(),
            current_index: self.current_index,
        }
    }

    /// Moves to the next applicable question, or to the summary.
    pub fn next(&self) -> Self {
        let target = self.scan_forward(self.current_index);
        debug!(from = self.current_index, to = target, "advanced questionnaire");
        self.at(target)
    }

    /// Moves to the nearest earlier applicable question, clamping at the
    /// first applicable question instead of running off the start.
    pub fn previous(&self) -> Self {
        let target = (0..self.current_index.min(self.len()))
            .rev()
            .find(|&position| self.is_applicable(position))
            .or_else(|| self.first_applicable())
            .unwrap_or(0);
        debug!(from = self.current_index, to = target, "retreated questionnaire");
        self.at(target)
    }

    pub fn summary(&self) -> Summary {
        summarize(self)
    }

    pub fn flatten(&self) -> FlatAnswers {
        flatten(self)
    }

    /// Number of questions that would currently be presented.
    pub fn applicable_count(&self) -> usize {
        (0..self.len())
            .filter(|&position| self.is_applicable(position))
            .count()
    }

    /// One-based rank of the current question among applicable questions,
    /// `None` in summary mode.
    pub fn step_number(&self) -> Option<usize> {
        if self.is_summary() {
            return None;
        }
        Some(
            (0..=self.current_index)
                .filter(|&position| self.is_applicable(position))
                .count(),
        )
    }

    pub(crate) fn is_applicable(&self, position: usize) -> bool {
        let question = &self.answers[position].question;
        match (&question.ask_when, self.index.dependencies[position]) {
            (Some(ask_when), Some(dependency)) => {
                self.condition_holds(dependency, &ask_when.equals_value)
            }
            _ => true,
        }
    }

    // Skipped dependencies still count through their effective value.
    fn condition_holds(&self, dependency: usize, equals: &str) -> bool {
        self.answers[dependency].effective_value() == equals
    }

    fn scan_forward(&self, from: usize) -> usize {
        let length = self.len();
        (from + 1..length)
            .find(|&position| self.is_applicable(position))
            .unwrap_or(length)
    }

    fn first_applicable(&self) -> Option<usize> {
        (0..self.len()).find(|&position| self.is_applicable(position))
    }

    fn at(&self, current_index: usize) -> Self {
        Self {
            index: Arc::clone(&self.index),
            answers: Arc::clone(&self.answers),
            current_index,
        }
    }
}

/// Starts a questionnaire session; see [`SessionState::initialize`].
pub fn initialize(questions: Vec<Question>) -> Result<SessionState, QuestionnaireError> {
    SessionState::initialize(questions)
}
