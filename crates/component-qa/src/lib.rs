mod renderer;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use jobqa_spec::{
    Question, QuestionnaireError, SessionSnapshot, SessionState, TemplateQuestions, build_render_payload,
    render_json_ui as qa_render_json_ui, render_text as qa_render_text, validate_questions,
};

pub use renderer::{
    HandlebarsRenderer, RenderError, RenderRequest, RenderedScript, SCRIPT_NAME_QUESTION_ID,
    ScriptRenderer, Submission,
};

const DEFAULT_TEMPLATES: &str = include_str!("../../qa-spec/tests/fixtures/gpu_job.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse session state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("template '{0}' is not available")]
    TemplateUnavailable(String),
    #[error("questionnaire for '{0}' is not finished")]
    Incomplete(String),
    #[error("'{value}' is not an option of question '{question}'")]
    InvalidOption { question: String, value: String },
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    /// A template-questions document, or an array of them.
    #[serde(default)]
    templates_json: Option<String>,
}

fn load_templates(config_json: &str) -> Result<Vec<TemplateQuestions>, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let templates_json = config.templates_json.as_deref().unwrap_or(DEFAULT_TEMPLATES);
    let value: Value = serde_json::from_str(templates_json).map_err(ComponentError::ConfigParse)?;
    let documents = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    documents
        .into_iter()
        .map(|document| TemplateQuestions::from_value(document).map_err(ComponentError::from))
        .collect()
}

fn ensure_template(template_id: &str, config_json: &str) -> Result<TemplateQuestions, ComponentError> {
    load_templates(config_json)?
        .into_iter()
        .find(|template| template.template_id == template_id)
        .ok_or_else(|| ComponentError::TemplateUnavailable(template_id.to_string()))
}

/// Restores the caller's session, or starts a fresh one when no state is
/// supplied.
fn load_session(template: &TemplateQuestions, state_json: &str) -> Result<SessionState, ComponentError> {
    let questions = template.questions.clone();
    if state_json.trim().is_empty() {
        return Ok(SessionState::initialize(questions)?);
    }
    let snapshot: SessionSnapshot =
        serde_json::from_str(state_json).map_err(ComponentError::StateParse)?;
    SessionState::restore(questions, &snapshot).map_err(|err| {
        warn!(template = %template.template_id, error = %err, "rejected session state");
        ComponentError::from(err)
    })
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn session_response(template: &TemplateQuestions, state: &SessionState) -> Result<Value, ComponentError> {
    let snapshot = serde_json::to_value(state.snapshot()).map_err(ComponentError::JsonEncode)?;
    let payload = build_render_payload(template, state);
    Ok(json!({
        "status": payload.status.as_str(),
        "state": snapshot,
        "view": qa_render_json_ui(&payload),
    }))
}

fn transition(
    template_id: &str,
    config_json: &str,
    state_json: &str,
    step: impl FnOnce(SessionState) -> SessionState,
) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = step(load_session(&template, state_json)?);
        session_response(&template, &state)
    }))
}

pub fn describe(template_id: &str, config_json: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        serde_json::to_value(template).map_err(ComponentError::JsonEncode)
    }))
}

pub fn validate(template_id: &str, config_json: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        serde_json::to_value(validate_questions(&template.questions))
            .map_err(ComponentError::JsonEncode)
    }))
}

pub fn start(template_id: &str, config_json: &str) -> String {
    debug!(template = template_id, "starting questionnaire");
    transition(template_id, config_json, "", |state| state)
}

/// Records `value` for the current question. Select questions only take one
/// of their option values, or the empty string to fall back to the default.
pub fn change(template_id: &str, config_json: &str, state_json: &str, value: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        if let Some(question) = state.current_question() {
            ensure_option(question, value)?;
        }
        session_response(&template, &state.change(value))
    }))
}

fn ensure_option(question: &Question, value: &str) -> Result<(), ComponentError> {
    let options = question.format.options();
    if value.is_empty() || options.is_empty() || options.iter().any(|option| option.value == value) {
        Ok(())
    } else {
        Err(ComponentError::InvalidOption {
            question: question.id.clone(),
            value: value.to_string(),
        })
    }
}

pub fn next(template_id: &str, config_json: &str, state_json: &str) -> String {
    transition(template_id, config_json, state_json, |state| state.next())
}

pub fn previous(template_id: &str, config_json: &str, state_json: &str) -> String {
    transition(template_id, config_json, state_json, |state| state.previous())
}

pub fn render_text(template_id: &str, config_json: &str, state_json: &str) -> String {
    respond_string(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        Ok(qa_render_text(&build_render_payload(&template, &state)))
    }))
}

pub fn render_json_ui(template_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        Ok(qa_render_json_ui(&build_render_payload(&template, &state)))
    }))
}

pub fn summary(template_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        let entries =
            serde_json::to_value(state.summary().entries).map_err(ComponentError::JsonEncode)?;
        Ok(json!({
            "complete": state.is_summary(),
            "entries": entries,
        }))
    }))
}

pub fn flatten(template_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        serde_json::to_value(state.flatten()).map_err(ComponentError::JsonEncode)
    }))
}

/// Builds the payload for the script renderer once the session reached the
/// summary.
pub fn render_request(
    template_id: &str,
    config_json: &str,
    state_json: &str,
    script_name: &str,
) -> String {
    respond(ensure_template(template_id, config_json).and_then(|template| {
        let state = load_session(&template, state_json)?;
        if !state.is_summary() {
            return Err(ComponentError::Incomplete(template.template_id));
        }
        let request = RenderRequest::new(&template.template_id, state.flatten(), script_name)?;
        serde_json::to_value(request).map_err(ComponentError::JsonEncode)
    }))
}
