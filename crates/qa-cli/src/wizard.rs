use std::fmt::Write;

use component_jobqa::Submission;
use serde_json::Value;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, progress and parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and results once the component yields a view.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &WizardPayload) {
        if self.header_printed {
            return;
        }
        println!("Template: {}", payload.title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        println!("Type 'back' to revisit the previous question or 'exit' to abort.");
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &WizardPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status.as_str(),
                payload.progress.step,
                payload.progress.total
            );
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.step, prompt.total, prompt.text);
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        if let Some(shown) = &prompt.shown_value {
            line.push_str(&format!(" [{}]", shown));
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        if !prompt.options.is_empty() {
            for (value, text) in &prompt.options {
                println!("  {} - {}", value, text);
            }
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_summary(&self, payload: &WizardPayload) {
        println!("Summary:");
        if payload.summary.is_empty() {
            println!("  (no questions)");
        }
        for (text, value) in &payload.summary {
            println!("  {}: {}", text, value);
        }
    }

    pub fn show_completion(&self, submission: &Submission) {
        println!("Done ✅");
        match submission.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match submission.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// View extracted from the component's JSON UI output.
pub struct WizardPayload {
    pub title: String,
    pub help: Option<String>,
    pub status: ViewStatus,
    pub progress: ViewProgress,
    pub question: Option<WizardQuestion>,
    pub summary: Vec<(String, String)>,
}

impl WizardPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let title = json
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| "wizard payload missing title".to_string())?
            .to_string();
        let help = json
            .get("help")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let status = ViewStatus::from_label(
            json.get("status")
                .and_then(Value::as_str)
                .unwrap_or("need_input"),
        );
        let progress = json
            .get("progress")
            .and_then(Value::as_object)
            .ok_or_else(|| "wizard payload missing progress".to_string())?;
        let step = progress.get("step").and_then(Value::as_u64).unwrap_or(0) as usize;
        let total = progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
        let question = match json.get("question") {
            None | Some(Value::Null) => None,
            Some(value) => Some(WizardQuestion::from_json(value)?),
        };
        let summary = json
            .get("summary")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| {
                        (
                            entry["text"].as_str().unwrap_or_default().to_string(),
                            entry["value"].as_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            title,
            help,
            status,
            progress: ViewProgress { step, total },
            question,
            summary,
        })
    }
}

/// Progress counters from the view.
pub struct ViewProgress {
    pub step: usize,
    pub total: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    NeedInput,
    Summary,
}

impl ViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStatus::NeedInput => "need_input",
            ViewStatus::Summary => "summary",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "summary" => ViewStatus::Summary,
            _ => ViewStatus::NeedInput,
        }
    }
}

/// Minimal view of a question used for rendering prompts.
pub struct WizardQuestion {
    pub id: String,
    pub text: String,
    pub description: Option<String>,
    pub kind: QuestionKind,
    pub default: String,
    pub current_value: String,
    pub options: Vec<(String, String)>,
}

impl WizardQuestion {
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "question missing id".to_string())?
            .to_string();
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("question '{}' missing text", id))?
            .to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let kind = QuestionKind::from_label(
            value
                .get("format")
                .and_then(Value::as_str)
                .unwrap_or("text"),
        );
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let value = option.get("value").and_then(Value::as_str)?;
                        let text = option.get("text").and_then(Value::as_str).unwrap_or(value);
                        Some((value.to_string(), text.to_string()))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Self {
            default: field("default"),
            current_value: field("current_value"),
            id,
            text,
            description,
            kind,
            options,
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub step: usize,
    pub total: usize,
    pub text: String,
    pub description: Option<String>,
    pub hint: Option<String>,
    /// Value kept when the user just presses Enter.
    pub shown_value: Option<String>,
    pub options: Vec<(String, String)>,
}

impl PromptContext {
    pub fn new(question: &WizardQuestion, progress: &ViewProgress) -> Self {
        let shown = if question.current_value.is_empty() {
            &question.default
        } else {
            &question.current_value
        };
        Self {
            step: progress.step.max(1),
            total: progress.total,
            text: question.text.clone(),
            description: question.description.clone(),
            hint: question.kind.hint(&question.options),
            shown_value: (!shown.is_empty()).then(|| shown.clone()),
            options: question.options.clone(),
        }
    }
}

/// Supported formats for question prompts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    MultilineText,
    Select,
    Unknown,
}

impl QuestionKind {
    fn from_label(label: &str) -> Self {
        match label {
            "text" => QuestionKind::Text,
            "multiline_text" => QuestionKind::MultilineText,
            "select" => QuestionKind::Select,
            _ => QuestionKind::Unknown,
        }
    }

    fn hint(&self, options: &[(String, String)]) -> Option<String> {
        match self {
            QuestionKind::MultilineText => Some("(use \\n for line breaks)".to_string()),
            QuestionKind::Select if !options.is_empty() => Some(format!(
                "({})",
                options
                    .iter()
                    .map(|(value, _)| value.as_str())
                    .collect::<Vec<_>>()
                    .join("/")
            )),
            _ => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
