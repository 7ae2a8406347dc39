// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response body normalization and delivery identifier extraction.

use serde_json::Value;

/// Response header that may carry the delivery identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Parse a response body, falling back to an empty object.
///
/// Empty bodies, invalid JSON, and a literal `null` all normalize to `{}`.
pub fn normalize_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) | Err(_) => Value::Object(Default::default()),
        Ok(value) => value,
    }
}

/// Pick the delivery identifier from a successful response.
///
/// Priority: `messageId` body field, then the `X-Request-ID` header, then the
/// `id` body field. Strings and numbers are accepted; empty strings are ignored.
pub fn extract_identifier(body: &Value, request_id: Option<&str>) -> Option<String> {
    field_as_id(body, "messageId")
        .or_else(|| {
            request_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .or_else(|| field_as_id(body, "id"))
}

fn field_as_id(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_or_null_bodies_become_empty_object() {
        assert_eq!(normalize_body(b""), json!({}));
        assert_eq!(normalize_body(b"<html>oops</html>"), json!({}));
        assert_eq!(normalize_body(b"null"), json!({}));
        assert_eq!(normalize_body(br#"{"ok":true}"#), json!({"ok": true}));
    }

    #[test]
    fn non_object_json_is_preserved() {
        assert_eq!(normalize_body(b"[1,2]"), json!([1, 2]));
    }

    #[test]
    fn message_id_wins_over_header_and_id() {
        let body = json!({"messageId": "m-1", "id": "i-1"});
        assert_eq!(
            extract_identifier(&body, Some("h-1")),
            Some("m-1".to_string())
        );
    }

    #[test]
    fn header_wins_over_id_field() {
        let body = json!({"id": "i-1"});
        assert_eq!(
            extract_identifier(&body, Some("h-1")),
            Some("h-1".to_string())
        );
    }

    #[test]
    fn id_field_is_last_resort() {
        let body = json!({"id": 42});
        assert_eq!(extract_identifier(&body, None), Some("42".to_string()));
    }

    #[test]
    fn empty_values_are_skipped() {
        let body = json!({"messageId": "", "id": "i-1"});
        assert_eq!(extract_identifier(&body, Some("  ")), Some("i-1".to_string()));
        assert_eq!(extract_identifier(&json!({}), None), None);
        assert_eq!(extract_identifier(&json!({"messageId": null}), None), None);
    }
}
