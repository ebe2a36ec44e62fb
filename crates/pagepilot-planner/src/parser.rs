//! Model output to validated plan.

use std::collections::HashSet;

use serde_json::{Map, Value};

use pagepilot_protocols::{ParseError, PlannedStep, StepAction};

/// Find the first complete JSON object in `text`.
///
/// Prose or code fences around the object are ignored. Each `{` is tried as
/// a start position until one yields an object.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(object))) = stream.next() {
            return Ok(object);
        }
    }

    let preview: String = text.trim().chars().take(80).collect();
    Err(ParseError::MalformedOutput(if preview.is_empty() {
        "empty output".to_string()
    } else {
        format!("no JSON object found in {:?}", preview)
    }))
}

/// Parse raw model text into steps ordered by `step_number`.
pub fn parse_plan(raw: &str) -> Result<Vec<PlannedStep>, ParseError> {
    let mut object = extract_json_object(raw)?;

    let steps = match object.remove("steps") {
        Some(Value::Array(steps)) if !steps.is_empty() => steps,
        _ => return Err(ParseError::MissingSteps),
    };

    let mut seen = HashSet::with_capacity(steps.len());
    let mut parsed = Vec::with_capacity(steps.len());
    for (index, value) in steps.into_iter().enumerate() {
        let step = validate_step(value).map_err(|cause| ParseError::InvalidStep { index, cause })?;
        if !seen.insert(step.step_number) {
            return Err(ParseError::InvalidStep {
                index,
                cause: format!("duplicate step_number {}", step.step_number),
            });
        }
        parsed.push(step);
    }

    parsed.sort_by_key(|s| s.step_number);
    Ok(parsed)
}

fn validate_step(value: Value) -> Result<PlannedStep, String> {
    if !value.is_object() {
        return Err(format!("expected an object, got {}", value_kind(&value)));
    }

    let mut step: PlannedStep = serde_json::from_value(value).map_err(|e| e.to_string())?;

    if step.step_number == 0 {
        return Err("step_number must be positive".to_string());
    }

    if step.action.requires_target() {
        match &step.target_hints {
            None => return Err(format!("{} step requires target_hints", step.action)),
            Some(hints) if !hints.has_anchor() => {
                return Err(format!(
                    "{} step needs text_contains, placeholder_contains or selector_pattern",
                    step.action
                ));
            }
            Some(_) => {}
        }
    }

    if step.action == StepAction::Type {
        if step.text_input.is_none() {
            return Err("TYPE step requires text_input".to_string());
        }
    } else {
        step.text_input = None;
    }

    Ok(step)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
