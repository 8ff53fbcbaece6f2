//! JSON envelopes shared by every `/v1` response.

use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Map, Value};

/// `{"status": "ok", ...fields}`. Non-object `fields` are ignored.
pub fn success(fields: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("status".into(), json!("ok"));
    if let Value::Object(fields) = fields {
        body.extend(fields);
    }
    Json(Value::Object(body))
}

/// `{"status": "error", "error": {"code": ..., "message": ...}}`.
pub fn error_body(status: StatusCode, message: &str) -> Json<Value> {
    Json(json!({
        "status": "error",
        "error": {
            "code": status.as_u16(),
            "message": message,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_without_fields() {
        assert_eq!(success(json!({})).0, json!({"status": "ok"}));
    }

    #[test]
    fn success_merges_fields() {
        let Json(body) = success(json!({"a": 1, "b": "c"}));
        assert_eq!(body, json!({"status": "ok", "a": 1, "b": "c"}));
    }

    #[test]
    fn error_envelope() {
        let Json(body) = error_body(StatusCode::NOT_FOUND, "fragment not found");
        assert_eq!(
            body,
            json!({"status": "error", "error": {"code": 404, "message": "fragment not found"}})
        );
    }
}
