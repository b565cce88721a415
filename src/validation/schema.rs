//! Structural completeness of a raw candidate.
//!
//! Works on the untyped JSON so that a malformed candidate still yields a
//! precise list of what is missing, rather than a single decode error.
//! Evaluation's completeness metric counts the same gaps.

use serde_json::Value;

use crate::effects::vocab;

/// Gap reported for an empty or non-array operation list.
pub const EMPTY_OPERATIONS: &str = "operations (must be non-empty array)";

/// Fields that hold nested operation lists.
const BODY_FIELDS: [&str; 3] = ["then", "else", "operations"];

/// Every structural gap in `raw`, as a field path with an optional note.
///
/// An empty result means the required shape is present; it does not
/// guarantee the candidate decodes.
pub fn schema_gaps(raw: &Value) -> Vec<String> {
    let Some(root) = raw.as_object() else {
        return vec!["effect (must be an object)".to_string()];
    };
    let mut gaps = Vec::new();

    match root.get("target") {
        Some(target) if target.is_object() => {
            if !target.get("type").is_some_and(Value::is_string) {
                gaps.push("target.type".to_string());
            }
        }
        _ => gaps.push("target".to_string()),
    }

    match root.get("operations") {
        None => gaps.push("operations".to_string()),
        Some(Value::Array(operations)) if !operations.is_empty() => {
            operation_gaps(operations, "operations", &mut gaps);
        }
        Some(_) => gaps.push(EMPTY_OPERATIONS.to_string()),
    }

    match root.get("timing") {
        Some(timing) if timing.is_object() => {
            if !timing.get("type").is_some_and(Value::is_string) {
                gaps.push("timing.type".to_string());
            }
        }
        _ => gaps.push("timing".to_string()),
    }

    gaps
}

fn operation_gaps(operations: &[Value], path: &str, gaps: &mut Vec<String>) {
    for (index, operation) in operations.iter().enumerate() {
        let here = format!("{path}[{index}]");
        match operation.get("op") {
            Some(Value::String(op)) if vocab::is_operation_name(op) => {}
            Some(Value::String(op)) => gaps.push(format!("{here}.op (invalid: {op})")),
            _ => {
                gaps.push(format!("{here}.op"));
                continue;
            }
        }

        for field in BODY_FIELDS {
            if let Some(Value::Array(body)) = operation.get(field) {
                operation_gaps(body, &format!("{here}.{field}"), gaps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_effect_has_no_gaps() {
        let gaps = schema_gaps(&json!({
            "target": {"type": "single"},
            "operations": [{"op": "heal", "amount": 5}],
            "timing": {"type": "immediate"}
        }));
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_empty_operations() {
        let gaps = schema_gaps(&json!({
            "target": {"type": "single"},
            "operations": [],
            "timing": {"type": "immediate"}
        }));
        assert_eq!(gaps, vec![EMPTY_OPERATIONS.to_string()]);
    }

    #[test]
    fn test_missing_sections() {
        let gaps = schema_gaps(&json!({ "target": {} }));
        assert_eq!(gaps, vec!["target.type", "operations", "timing"]);
    }

    #[test]
    fn test_nested_invalid_op() {
        let gaps = schema_gaps(&json!({
            "target": {"type": "single"},
            "operations": [
                {"op": "repeat", "times": 2, "operations": [{"op": "summon_meteor"}]},
                {"amount": 3}
            ],
            "timing": {"type": "immediate"}
        }));
        assert_eq!(
            gaps,
            vec![
                "operations[0].operations[0].op (invalid: summon_meteor)",
                "operations[1].op",
            ]
        );
    }

    #[test]
    fn test_non_object() {
        assert_eq!(schema_gaps(&json!([1, 2])).len(), 1);
    }
}
