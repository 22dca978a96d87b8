use serde_json::Value;

/// Plain text of the first choice of an OpenAI-shaped completion.
///
/// Multi-part content is flattened by joining each part's `text` (or, failing
/// that, `value`) with newlines. Missing choices, a missing message, or content
/// of any other shape yield an empty string.
pub fn extract_response_text(completion: &Value) -> String {
    let Some(message) = completion
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
    else {
        return String::new();
    };

    match message.get("content") {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| {
                part.get("text")
                    .and_then(Value::as_str)
                    .or_else(|| part.get("value").and_then(Value::as_str))
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        _ => String::new(),
    }
}
