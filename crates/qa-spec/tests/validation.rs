use serde_json::json;

use jobqa_spec::{
    Question, QuestionFormat, QuestionnaireError, SelectOption, TemplateQuestions,
    answers_schema, initialize, template_schema, validate_questions,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "gpu_job" => include_str!("../tests/fixtures/gpu_job.json"),
        "forward_dependency" => include_str!("../tests/fixtures/forward_dependency.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn select(values: &[&str]) -> QuestionFormat {
    QuestionFormat::Select {
        options: values
            .iter()
            .map(|value| SelectOption::new(*value, value.to_uppercase()))
            .collect(),
    }
}

#[test]
fn fixture_template_is_valid() {
    let template = TemplateQuestions::from_json(fixture("gpu_job")).expect("deserialize");
    let report = validate_questions(&template.questions);
    assert!(report.valid, "unexpected issues: {}", report);
    assert!(report.issues.is_empty());
}

#[test]
fn broken_fixture_reports_every_issue() {
    let template =
        TemplateQuestions::from_json(fixture("forward_dependency")).expect("deserialize");
    let report = validate_questions(&template.questions);
    assert!(!report.valid);
    assert_eq!(report.codes(), vec!["forward_dependency", "missing_options"]);
    assert_eq!(report.issues[0].question_id.as_deref(), Some("partition"));
}

#[test]
fn validation_reports_identity_problems() {
    let questions = vec![
        Question::new("", "Blank"),
        Question::new("dup", "First"),
        Question::new("dup", "Second"),
        Question::new("self", "Self").asked_when("self", "x"),
        Question::new("orphan", "Orphan").asked_when("nowhere", "x"),
    ];
    let report = validate_questions(&questions);
    assert_eq!(
        report.codes(),
        vec![
            "empty_id",
            "duplicate_id",
            "self_dependency",
            "unknown_dependency"
        ]
    );
}

#[test]
fn validation_checks_select_options() {
    let questions = vec![
        Question::new("partition", "Partition")
            .with_format(select(&["short", "short"]))
            .with_default("long"),
    ];
    let report = validate_questions(&questions);
    assert_eq!(
        report.codes(),
        vec!["duplicate_option", "default_not_in_options"]
    );
}

#[test]
fn malformed_dependency_path_fails_to_parse() {
    let error = TemplateQuestions::from_value(json!({
        "template_id": "bad",
        "questions": [
            { "id": "a", "text": "A" },
            { "id": "b", "text": "B", "ask_when": { "question": "", "equals": "x" } }
        ]
    }))
    .expect_err("empty path rejected");
    assert!(matches!(error, QuestionnaireError::Parse(_)));
    assert!(error.to_string().contains("dependency path"));
}

#[test]
fn answers_schema_lists_every_question() {
    let template = TemplateQuestions::from_json(fixture("gpu_job")).unwrap();
    let state = initialize(template.questions).unwrap();
    let schema = answers_schema(&state);

    let props = schema["properties"].as_object().expect("properties");
    assert_eq!(props.len(), 6);
    assert_eq!(props["env"]["enum"], json!(["cpu", "gpu"]));
    assert_eq!(props["walltime"]["default"], "01:00:00");
    let required = schema["required"].as_array().expect("required");
    assert!(required.iter().any(|value| value == "gpu_count"));
}

#[test]
fn template_schema_describes_questions() {
    let schema = template_schema();
    let text = schema.to_string();
    assert!(text.contains("template_id"));
    assert!(text.contains("questions"));
}
