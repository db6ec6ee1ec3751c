//! Text extraction from provider responses.

use serde_json::Value;

/// Pulls the generated text out of a provider response.
///
/// Shapes are tried in order: OpenAI `choices[0].message.content`, Anthropic
/// `content[*].text`, Gemini `candidates[0].content.parts[*].text`, a top-level
/// `content` or `text` string, and finally a bare JSON string. Returns `None`
/// when none of them holds non-empty text.
pub fn extract_text(response: &Value) -> Option<String> {
    let candidates = [
        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        response.get("content").and_then(joined_parts),
        response
            .pointer("/candidates/0/content/parts")
            .and_then(joined_parts),
        response.get("content").and_then(Value::as_str).map(str::to_string),
        response.get("text").and_then(Value::as_str).map(str::to_string),
        response.as_str().map(str::to_string),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

/// Extracts text from a raw response body. Bodies that are not JSON are taken
/// as plain text.
pub fn extract_body_text(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => extract_text(&value),
        Err(_) => Some(body.trim().to_string()).filter(|text| !text.is_empty()),
    }
}

/// Concatenates the `text` fields of an array of content parts.
fn joined_parts(parts: &Value) -> Option<String> {
    let texts: Vec<&str> = parts
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!texts.is_empty()).then(|| texts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_shape() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "class A {}"}}]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("class A {}"));
    }

    #[test]
    fn test_anthropic_shape_joins_text_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "part one, "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "part two"}
            ]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("part one, part two"));
    }

    #[test]
    fn test_blank_top_level_content_falls_back_to_text() {
        let response = json!({"content": "", "text": "class A {}"});
        assert_eq!(extract_text(&response).as_deref(), Some("class A {}"));

        let response = json!({"content": "  \n", "text": "class B {}"});
        assert_eq!(extract_text(&response).as_deref(), Some("class B {}"));
    }

    #[test]
    fn test_gemini_shape() {
        let response = json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "hello"}]}}]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("hello"));
    }

    #[test]
    fn test_flat_shapes() {
        assert_eq!(extract_text(&json!({"content": "flat"})).as_deref(), Some("flat"));
        assert_eq!(extract_text(&json!({"text": "flat text"})).as_deref(), Some("flat text"));
        assert_eq!(extract_text(&json!("bare")).as_deref(), Some("bare"));
    }

    #[test]
    fn test_empty_openai_content_falls_through() {
        let response = json!({
            "choices": [{"message": {"content": ""}}],
            "text": "fallback"
        });
        assert_eq!(extract_text(&response).as_deref(), Some("fallback"));
    }

    #[test]
    fn test_nothing_usable() {
        assert_eq!(extract_text(&json!({"choices": []})), None);
        assert_eq!(extract_text(&json!({"content": "   "})), None);
        assert_eq!(extract_text(&json!(null)), None);
    }

    #[test]
    fn test_body_plain_text() {
        assert_eq!(extract_body_text("  class A {}\n").as_deref(), Some("class A {}"));
        assert_eq!(extract_body_text("   "), None);
        assert_eq!(
            extract_body_text(r#"{"choices":[{"message":{"content":"ok"}}]}"#).as_deref(),
            Some("ok")
        );
    }
}
