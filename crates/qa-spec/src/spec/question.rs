use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::QuestionnaireError;

static DEPENDENCY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<id>\S+?)(?:\.answer)?$").expect("dependency path pattern compiles")
});

/// One entry of a select question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Input widget used to collect an answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionFormat {
    #[default]
    Text,
    MultilineText,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
}

impl QuestionFormat {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionFormat::Text => "text",
            QuestionFormat::MultilineText => "multiline_text",
            QuestionFormat::Select { .. } => "select",
        }
    }

    /// Options of a select question; empty for free text formats.
    pub fn options(&self) -> &[SelectOption] {
        match self {
            QuestionFormat::Select { options } => options,
            _ => &[],
        }
    }
}

/// Gates a question on the resolved answer of an earlier question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAskWhen", into = "RawAskWhen")]
pub struct AskWhen {
    pub depends_on_question_id: String,
    pub equals_value: String,
}

impl AskWhen {
    pub fn new(depends_on: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            depends_on_question_id: depends_on.into(),
            equals_value: equals.into(),
        }
    }

    /// Parses the question source's `<id>.answer` path form.
    pub fn parse(path: &str, equals: impl Into<String>) -> Result<Self, QuestionnaireError> {
        let id = DEPENDENCY_PATH
            .captures(path.trim())
            .and_then(|captures| captures.name("id"))
            .map(|id| id.as_str().to_string())
            .ok_or_else(|| QuestionnaireError::InvalidDependencyPath {
                path: path.to_string(),
            })?;
        Ok(Self::new(id, equals))
    }
}

/// Wire form of [`AskWhen`] as delivered by the template-questions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawAskWhen {
    /// Dependency path, `<question id>.answer` or a bare question id.
    pub question: String,
    #[serde(alias = "value")]
    pub equals: String,
}

impl TryFrom<RawAskWhen> for AskWhen {
    type Error = QuestionnaireError;

    fn try_from(raw: RawAskWhen) -> Result<Self, Self::Error> {
        AskWhen::parse(&raw.question, raw.equals)
    }
}

impl From<AskWhen> for RawAskWhen {
    fn from(ask_when: AskWhen) -> Self {
        RawAskWhen {
            question: format!("{}.answer", ask_when.depends_on_question_id),
            equals: ask_when.equals_value,
        }
    }
}

/// Definition of a single question inside a template questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "QuestionWire")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default: String,
    pub format: QuestionFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<RawAskWhen>")]
    pub ask_when: Option<AskWhen>,
}

// Keeps the dependency path raw so a bad path can be reported with its question.
#[derive(Deserialize, JsonSchema)]
struct QuestionWire {
    id: String,
    text: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default: String,
    #[serde(default)]
    format: QuestionFormat,
    #[serde(default, alias = "askWhen")]
    ask_when: Option<RawAskWhen>,
}

impl TryFrom<QuestionWire> for Question {
    type Error = QuestionnaireError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        let ask_when = wire
            .ask_when
            .map(|RawAskWhen { question, equals }| {
                AskWhen::parse(&question, equals).map_err(|_| {
                    QuestionnaireError::InvalidQuestionDependency {
                        question: wire.id.clone(),
                        path: question.clone(),
                    }
                })
            })
            .transpose()?;
        Ok(Self {
            id: wire.id,
            text: wire.text,
            description: wire.description,
            default: wire.default,
            format: wire.format,
            ask_when,
        })
    }
}

impl Question {
    /// Free text question with an empty default.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            description: None,
            default: String::new(),
            format: QuestionFormat::Text,
            ask_when: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_format(mut self, format: QuestionFormat) -> Self {
        self.format = format;
        self
    }

    pub fn asked_when(mut self, depends_on: impl Into<String>, equals: impl Into<String>) -> Self {
        self.ask_when = Some(AskWhen::new(depends_on, equals));
        self
    }

    pub fn is_conditional(&self) -> bool {
        self.ask_when.is_some()
    }
}
