use serde_json::Value;

/// Parse `text` as JSON, treating any decode error as "no value".
pub fn parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Render one response field for display.
///
/// Strings are shown verbatim, absent and `null` fields render empty, and
/// everything else is pretty-printed with 2-space indentation.
pub fn format_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// Text form of an identifier-like scalar, or `None` when the value is empty.
///
/// Empty strings and zero are skipped so that placeholder values never win an
/// identifier lookup; objects, arrays and booleans are not identifiers.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a decoded payload carries anything: `null`, `false`, `0` and `""`
/// do not, while arrays and objects always do (even when empty).
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
