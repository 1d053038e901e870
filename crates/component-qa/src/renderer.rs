use handlebars::{Handlebars, no_escape};
use jobqa_spec::FlatAnswers;
use serde::{Deserialize, Serialize};
use serde_cbor::{to_vec, value::to_value};
use thiserror::Error;
use tracing::debug;

/// Id of the synthetic question carrying the output file name.
pub const SCRIPT_NAME_QUESTION_ID: &str = "script_name";

const SCRIPT_TEMPLATE_NAME: &str = "script";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("question id '{0}' is reserved for the script name")]
    ReservedQuestionId(String),
    #[error("invalid script name '{0}'")]
    InvalidScriptName(String),
    #[error("script template does not compile: {0}")]
    Template(String),
    #[error("script rendering failed: {0}")]
    Render(String),
}

/// Payload accepted by a script renderer: the flattened answers plus the
/// synthetic script name question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub template_id: String,
    pub answers: FlatAnswers,
}

impl RenderRequest {
    pub fn new(
        template_id: impl Into<String>,
        mut answers: FlatAnswers,
        script_name: &str,
    ) -> Result<Self, RenderError> {
        if answers.contains_key(SCRIPT_NAME_QUESTION_ID) {
            return Err(RenderError::ReservedQuestionId(
                SCRIPT_NAME_QUESTION_ID.to_string(),
            ));
        }
        let script_name = validate_script_name(script_name)?;
        answers.insert(SCRIPT_NAME_QUESTION_ID.to_string(), script_name);
        Ok(Self {
            template_id: template_id.into(),
            answers,
        })
    }

    pub fn script_name(&self) -> &str {
        self.answers
            .get(SCRIPT_NAME_QUESTION_ID)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn validate_script_name(raw: &str) -> Result<String, RenderError> {
    let name = raw.trim();
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.chars().any(char::is_control);
    if invalid {
        Err(RenderError::InvalidScriptName(raw.to_string()))
    } else {
        Ok(name.to_string())
    }
}

/// A generated job script ready to be downloaded or written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedScript {
    pub file_name: String,
    pub contents: String,
}

/// Anything that turns a render request into a job script.
pub trait ScriptRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedScript, RenderError>;
}

/// Local renderer backed by a Handlebars job-script template.
///
/// Strict mode is enabled so a template referring to a question the
/// questionnaire does not define fails instead of emitting an empty line.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new(source: &str) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);
        registry
            .register_template_string(SCRIPT_TEMPLATE_NAME, source)
            .map_err(|err| RenderError::Template(err.to_string()))?;
        Ok(Self { registry })
    }
}

impl ScriptRenderer for HandlebarsRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedScript, RenderError> {
        let contents = self
            .registry
            .render(SCRIPT_TEMPLATE_NAME, &request.answers)
            .map_err(|err| RenderError::Render(err.to_string()))?;
        debug!(
            template = %request.template_id,
            bytes = contents.len(),
            "rendered job script"
        );
        Ok(RenderedScript {
            file_name: request.script_name().to_string(),
            contents,
        })
    }
}

/// Record of a finished questionnaire, as submitted to the render service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub template_id: String,
    pub script_name: String,
    pub answers: FlatAnswers,
}

impl Submission {
    pub fn from_request(request: &RenderRequest) -> Self {
        let mut answers = request.answers.clone();
        answers.remove(SCRIPT_NAME_QUESTION_ID);
        Self {
            template_id: request.template_id.clone(),
            script_name: request.script_name().to_string(),
            answers,
        }
    }

    /// Serializes the submission as canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        let canonical = to_value(self)?;
        to_vec(&canonical)
    }

    /// Serializes the submission as indented JSON for debugging.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
