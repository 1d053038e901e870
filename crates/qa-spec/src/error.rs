use thiserror::Error;

use crate::validate::ValidationReport;

/// Errors raised while loading questions or driving a questionnaire session.
#[derive(Debug, Error)]
pub enum QuestionnaireError {
    #[error("question configuration is invalid: {0}")]
    InvalidConfiguration(ValidationReport),
    #[error("question '{question}' depends on unknown question '{depends_on}'")]
    UnknownDependency { question: String, depends_on: String },
    #[error("'{path}' is not a valid dependency path (expected '<question>.answer')")]
    InvalidDependencyPath { path: String },
    #[error(
        "question '{question}' has an invalid dependency path '{path}' (expected '<question>.answer')"
    )]
    InvalidQuestionDependency { question: String, path: String },
    #[error("snapshot holds {found} values but the template has {expected} questions")]
    SnapshotMismatch { expected: usize, found: usize },
    #[error("cursor {cursor} is past the end of a {length}-question session")]
    CursorOutOfRange { cursor: usize, length: usize },
    #[error("answers must be a JSON object of question ids to values")]
    InvalidAnswers,
    #[error("failed to parse template questions: {0}")]
    Parse(#[from] serde_json::Error),
}
