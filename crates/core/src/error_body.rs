//! Extraction of human-readable messages from service error bodies.
//!
//! The conversion backend reports failures as `{"detail": ...}`, the AI
//! edit route as `{"error": ...}`, and some proxies as `{"message": ...}`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

/// Pick the most specific message out of an error response body.
///
/// Non-JSON bodies are returned trimmed; `fallback` covers empty bodies and
/// JSON objects without a usable field.
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(trimmed) else {
        return if trimmed.is_empty() {
            fallback.to_string()
        } else {
            trimmed.to_string()
        };
    };

    [parsed.detail, parsed.error, parsed.message]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_detail_field() {
        let body = r#"{"detail": "Invalid PXVG format", "error_code": "INVALID"}"#;
        assert_eq!(extract_error_message(body, "x"), "Invalid PXVG format");
    }

    #[test]
    fn reads_error_field() {
        let body = r#"{"error": "Missing userPrompt"}"#;
        assert_eq!(extract_error_message(body, "x"), "Missing userPrompt");
    }

    #[test]
    fn reads_message_field() {
        let body = r#"{"message": "upstream timeout"}"#;
        assert_eq!(extract_error_message(body, "x"), "upstream timeout");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        // FastAPI validation errors carry a list in `detail`.
        let body = r#"{"detail": [{"loc": ["body", "scale"], "msg": "too large"}]}"#;
        let message = extract_error_message(body, "x");
        assert!(message.contains("too large"));
    }

    #[test]
    fn non_json_body_is_returned_trimmed() {
        assert_eq!(
            extract_error_message("  Bad Gateway\n", "x"),
            "Bad Gateway"
        );
    }

    #[test]
    fn empty_body_uses_fallback() {
        assert_eq!(extract_error_message("", "AI edit failed"), "AI edit failed");
        assert_eq!(extract_error_message("{}", "AI edit failed"), "AI edit failed");
    }
}
