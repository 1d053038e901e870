#![allow(missing_docs)]

pub mod answers_schema;
pub mod error;
pub mod render;
pub mod runner;
pub mod session;
pub mod spec;
pub mod summary;
pub mod validate;

pub use answers_schema::{generate as answers_schema, template_schema};
pub use error::QuestionnaireError;
pub use render::{
    RenderPayload, RenderProgress, RenderQuestion, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use runner::{ReplayOutcome, answers_from_value, replay};
pub use session::{Answer, Position, SessionSnapshot, SessionState, initialize};
pub use spec::{AskWhen, Question, QuestionFormat, RawAskWhen, SelectOption, TemplateQuestions};
pub use summary::{FlatAnswers, Summary, SummaryEntry, flatten, summarize};
pub use validate::{ConfigIssue, ValidationReport, validate_questions};
