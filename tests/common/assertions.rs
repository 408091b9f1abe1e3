//! Custom assertions for integration tests

use serde_json::Value;

/// Assert that output is valid JSON and return parsed value
pub fn assert_valid_json(output: &str, context: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|e| {
        panic!(
            "Expected valid JSON ({}): {}\nOutput:\n{}",
            context, e, output
        )
    })
}

/// Assert a success envelope and return its data
pub fn assert_envelope_ok(body: &Value) -> &Value {
    assert_eq!(
        body["success"], true,
        "Expected success envelope, got:\n{}",
        body
    );
    assert!(body.get("error").is_none(), "Success envelope carries an error");
    &body["data"]
}

/// Assert a failure envelope with the given error code
pub fn assert_envelope_err(body: &Value, code: &str) {
    assert_eq!(
        body["success"], false,
        "Expected failure envelope, got:\n{}",
        body
    );
    assert_eq!(body["error"]["code"], code, "Unexpected error in:\n{}", body);
    assert!(body["error"]["message"].is_string());
}

/// Assert a server message has the given `type` tag
pub fn assert_message_type(msg: &Value, expected: &str) {
    assert_eq!(
        msg["type"], expected,
        "Expected '{}' message, got:\n{}",
        expected, msg
    );
}
