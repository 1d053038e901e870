use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuestionnaireError;
use crate::spec::question::Question;

/// Ordered questionnaire attached to a job-script template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateQuestions {
    pub template_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl TemplateQuestions {
    pub fn new(template_id: impl Into<String>, questions: Vec<Question>) -> Self {
        let template_id = template_id.into();
        Self {
            title: template_id.clone(),
            template_id,
            description: None,
            questions,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, QuestionnaireError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, QuestionnaireError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_uses_id_as_title() {
        let template = TemplateQuestions::new(
            "array-job",
            vec![Question::new("tasks", "Task count").with_default("10")],
        );
        assert_eq!(template.title, "array-job");
        assert_eq!(template.question("tasks").map(|q| q.default.as_str()), Some("10"));
        assert!(template.question("missing").is_none());
    }

    #[test]
    fn from_value_reports_the_broken_question() {
        let err = TemplateQuestions::from_value(json!({
            "template_id": "broken",
            "questions": [
                { "id": "env", "text": "Environment" },
                { "id": "gpu_type", "text": "GPU", "askWhen": { "question": "", "value": "gpu" } }
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("question 'gpu_type'"), "{}", err);
    }
}
