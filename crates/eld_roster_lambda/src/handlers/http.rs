use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response shape expected by the API gateway proxy integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Unwrap a gateway proxy event down to its JSON payload. Direct
/// invocations (no `body` field) pass through unchanged.
pub fn normalize_apigw_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

/// HTTP method of the invocation, wherever the gateway put it. Absent for
/// direct invocations.
pub fn request_method(event: &Value) -> Option<&str> {
    event
        .get("httpMethod")
        .and_then(Value::as_str)
        .or_else(|| {
            event
                .pointer("/requestContext/http/method")
                .and_then(Value::as_str)
        })
}

/// Reject events carrying the wrong HTTP method. Events without a method
/// (scheduled or direct invocations) are accepted.
pub fn require_method(event: &Value, expected: &str) -> Result<(), ApiGatewayResponse> {
    match request_method(event) {
        Some(method) if !method.eq_ignore_ascii_case(expected) => Err(error_response(
            405,
            json!({
                "error": "method_not_allowed",
                "message": format!("{method} is not supported; use {expected}"),
            }),
        )),
        _ => Ok(()),
    }
}

pub fn validation_error_response(message: &str) -> ApiGatewayResponse {
    error_response(
        400,
        json!({
            "error": "validation_error",
            "message": message,
        }),
    )
}

pub fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: serde_json::to_string(&payload).expect("response payload should serialize"),
    }
}

pub fn error_response(status_code: u16, payload: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}
