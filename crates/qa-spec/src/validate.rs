use std::collections::{BTreeSet, HashMap};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::{Question, QuestionFormat, SelectOption};

/// A single problem found in a question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub message: String,
    pub code: String,
}

/// Result returned from [`validate_questions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ConfigIssue>,
}

impl ValidationReport {
    pub fn codes(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.code.as_str()).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let described = self
            .issues
            .iter()
            .map(|issue| match &issue.question_id {
                Some(id) => format!("{} ({}): {}", id, issue.code, issue.message),
                None => format!("({}) {}", issue.code, issue.message),
            })
            .collect::<Vec<_>>();
        write!(f, "{}", described.join("; "))
    }
}

/// Checks ids, dependencies and select options of an ordered question list.
///
/// Dependencies may only point at questions that appear earlier in the list,
/// which keeps the applicability predicate acyclic.
pub fn validate_questions(questions: &[Question]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut first_position: HashMap<&str, usize> = HashMap::new();

    for (position, question) in questions.iter().enumerate() {
        if question.id.trim().is_empty() {
            issues.push(ConfigIssue {
                question_id: None,
                message: format!("question at position {} has an empty id", position),
                code: "empty_id".into(),
            });
            continue;
        }
        if first_position.contains_key(question.id.as_str()) {
            issues.push(issue(question, "id is used more than once", "duplicate_id"));
            continue;
        }
        first_position.insert(question.id.as_str(), position);
    }

    for (position, question) in questions.iter().enumerate() {
        if let Some(ask_when) = &question.ask_when {
            let dependency = ask_when.depends_on_question_id.as_str();
            if dependency == question.id {
                issues.push(issue(
                    question,
                    "question cannot depend on its own answer",
                    "self_dependency",
                ));
            } else {
                match first_position.get(dependency) {
                    None => issues.push(issue(
                        question,
                        &format!("depends on unknown question '{}'", dependency),
                        "unknown_dependency",
                    )),
                    Some(&dependency_position) if dependency_position > position => {
                        issues.push(issue(
                            question,
                            &format!("depends on later question '{}'", dependency),
                            "forward_dependency",
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        if let QuestionFormat::Select { options } = &question.format {
            check_options(question, options, &mut issues);
        }
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

fn check_options(
    question: &Question,
    options: &[SelectOption],
    issues: &mut Vec<ConfigIssue>,
) {
    if options.is_empty() {
        issues.push(issue(
            question,
            "select question has no options",
            "missing_options",
        ));
        return;
    }

    let mut seen = BTreeSet::new();
    for option in options {
        if !seen.insert(option.value.as_str()) {
            issues.push(issue(
                question,
                &format!("option value '{}' is repeated", option.value),
                "duplicate_option",
            ));
        }
    }

    if !question.default.is_empty() && !seen.contains(question.default.as_str()) {
        issues.push(issue(
            question,
            &format!("default '{}' matches no option value", question.default),
            "default_not_in_options",
        ));
    }
}

fn issue(question: &Question, message: &str, code: &str) -> ConfigIssue {
    ConfigIssue {
        question_id: Some(question.id.clone()),
        message: message.into(),
        code: code.into(),
    }
}
