use serde_json::{Map, Value, json};

use crate::{
    session::SessionState,
    spec::{question::QuestionFormat, template::TemplateQuestions},
    summary::SummaryEntry,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A question is waiting for input.
    NeedInput,
    /// The cursor is past the last question.
    Summary,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Summary => "summary",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// One-based step of the current question; equals `total` on the summary.
    pub step: usize,
    pub total: usize,
}

/// The question under the cursor.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub text: String,
    pub description: Option<String>,
    pub format: QuestionFormat,
    pub default: String,
    pub current_value: String,
    pub effective_value: String,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub template_id: String,
    pub title: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub question: Option<RenderQuestion>,
    pub summary: Vec<SummaryEntry>,
}

/// Build the renderer payload for the current position of a session.
pub fn build_render_payload(template: &TemplateQuestions, state: &SessionState) -> RenderPayload {
    let total = state.applicable_count();
    let question = state.current().map(|answer| {
        let question = answer.question();
        RenderQuestion {
            id: question.id.clone(),
            text: question.text.clone(),
            description: question.description.clone(),
            format: question.format.clone(),
            default: question.default.clone(),
            current_value: answer.value().to_string(),
            effective_value: answer.effective_value().to_string(),
        }
    });

    let (status, summary) = if state.is_summary() {
        (RenderStatus::Summary, state.summary().entries)
    } else {
        (RenderStatus::NeedInput, Vec::new())
    };

    RenderPayload {
        template_id: template.template_id.clone(),
        title: template.title.clone(),
        help: template.description.clone(),
        status,
        progress: RenderProgress {
            step: state.step_number().unwrap_or(total),
            total,
        },
        question,
        summary,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let question = payload
        .question
        .as_ref()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("text".into(), Value::String(question.text.clone()));
            map.insert(
                "description".into(),
                question
                    .description
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            );
            map.insert(
                "format".into(),
                Value::String(question.format.label().to_string()),
            );
            map.insert("default".into(), Value::String(question.default.clone()));
            map.insert(
                "current_value".into(),
                Value::String(question.current_value.clone()),
            );
            map.insert(
                "effective_value".into(),
                Value::String(question.effective_value.clone()),
            );
            let options = question.format.options();
            if !options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(
                        options
                            .iter()
                            .map(|option| json!({ "value": option.value, "text": option.text }))
                            .collect(),
                    ),
                );
            }
            Value::Object(map)
        })
        .unwrap_or(Value::Null);

    let summary = payload
        .summary
        .iter()
        .map(|entry| {
            json!({
                "question_id": entry.question_id,
                "text": entry.text,
                "value": entry.value,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "template_id": payload.template_id,
        "title": payload.title,
        "help": payload.help,
        "status": payload.status.as_str(),
        "progress": {
            "step": payload.progress.step,
            "total": payload.progress.total,
        },
        "question": question,
        "summary": summary,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Template: {} ({})", payload.title, payload.template_id));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.step,
        payload.progress.total
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    if let Some(question) = &payload.question {
        lines.push(format!("Question: {}", question.text));
        if let Some(description) = &question.description {
            lines.push(format!("  Description: {}", description));
        }
        for option in question.format.options() {
            lines.push(format!("  - {} ({})", option.value, option.text));
        }
        if !question.default.is_empty() {
            lines.push(format!("  Default: {}", question.default));
        }
        if !question.current_value.is_empty() {
            lines.push(format!("  Current value: {}", question.current_value));
        }
    } else {
        lines.push("Summary:".to_string());
        for entry in &payload.summary {
            lines.push(format!(" - {}: {}", entry.text, entry.value));
        }
    }

    lines.join("\n")
}
