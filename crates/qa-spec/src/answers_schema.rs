use serde_json::{Map, Value, json};

use crate::session::SessionState;
use crate::spec::template::TemplateQuestions;

/// JSON Schema describing the flattened answer payload of a session.
///
/// Every question contributes a string property, including skipped ones,
/// since flattening always emits them. The `enum` of a select question holds
/// its option values; the session itself stores any string, so callers that
/// record answers directly on a [`SessionState`] must keep to the options
/// (the component facade rejects anything else).
pub fn generate(state: &SessionState) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in state.questions() {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("string".into()));
        schema.insert("title".into(), Value::String(question.text.clone()));
        if let Some(description) = &question.description {
            schema.insert("description".into(), Value::String(description.clone()));
        }
        if !question.default.is_empty() {
            schema.insert("default".into(), Value::String(question.default.clone()));
        }
        let options = question.format.options();
        if !options.is_empty() {
            let mut values = options
                .iter()
                .map(|option| Value::String(option.value.clone()))
                .collect::<Vec<_>>();
            // skipped select questions flatten to their (possibly empty) default
            if question.default.is_empty() {
                values.push(Value::String(String::new()));
            }
            schema.insert("enum".into(), Value::Array(values));
        }
        properties.insert(question.id.clone(), Value::Object(schema));
        required.push(Value::String(question.id.clone()));
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Schema of the template-questions document itself.
pub fn template_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(TemplateQuestions)).unwrap_or_default()
}
