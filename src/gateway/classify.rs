//! Failure classification for non-2xx responses.
//!
//! [`RULES`] is evaluated top to bottom and the first rule that matches wins.
//! The order is part of the contract: a 404 carrying a `detail` message is a
//! domain error, not a generic "not found".

use serde_json::Value;
use tracing::trace;

use super::error::{ApiError, FieldErrors};

/// Field name used for `errors` payloads that are a bare list.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// A failed response as seen by the classifier. Bodies that are not JSON are
/// treated as absent.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl FailedResponse {
    #[must_use]
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn from_raw(status: u16, raw_body: &str) -> Self {
        Self {
            status,
            body: serde_json::from_str(raw_body).ok(),
        }
    }

    /// A top-level body field, ignoring explicit nulls.
    fn field(&self, name: &str) -> Option<&Value> {
        self.body
            .as_ref()
            .and_then(|body| body.get(name))
            .filter(|value| !value.is_null())
    }
}

pub type Rule = fn(&FailedResponse) -> Option<ApiError>;

pub const RULES: [(&str, Rule); 7] = [
    ("unauthorized", unauthorized),
    ("forbidden", forbidden),
    ("detail", detail),
    ("not_found", not_found),
    ("server_error", server_error),
    ("error", error_field),
    ("errors", errors_field),
];

/// Maps a failed response to exactly one [`ApiError`]. Responses no rule
/// recognises become a silent [`ApiError::Transport`].
#[must_use]
pub fn classify(response: &FailedResponse) -> ApiError {
    RULES
        .iter()
        .find_map(|(name, rule)| {
            rule(response).inspect(|_| trace!(rule = name, status = response.status, "classified"))
        })
        .unwrap_or_else(|| ApiError::Transport {
            status: Some(response.status),
            message: format!("unclassified response with status {}", response.status),
        })
}

fn unauthorized(response: &FailedResponse) -> Option<ApiError> {
    (response.status == 401).then_some(ApiError::Unauthorized)
}

fn forbidden(response: &FailedResponse) -> Option<ApiError> {
    (response.status == 403).then_some(ApiError::Forbidden)
}

fn detail(response: &FailedResponse) -> Option<ApiError> {
    response.field("detail").map(|value| ApiError::Domain {
        status: response.status,
        message: value_text(value),
    })
}

fn not_found(response: &FailedResponse) -> Option<ApiError> {
    (response.status == 404).then_some(ApiError::NotFound)
}

fn server_error(response: &FailedResponse) -> Option<ApiError> {
    (response.status >= 500).then_some(ApiError::ServerError {
        status: response.status,
    })
}

fn error_field(response: &FailedResponse) -> Option<ApiError> {
    response.field("error").map(|value| ApiError::Domain {
        status: response.status,
        message: value_text(value),
    })
}

fn errors_field(response: &FailedResponse) -> Option<ApiError> {
    let errors = response.field("errors")?;
    let fields = match errors {
        Value::Object(map) => map
            .iter()
            .map(|(field, messages)| FieldErrors {
                field: field.clone(),
                messages: string_list(messages),
            })
            .collect(),
        other => vec![FieldErrors {
            field: NON_FIELD_ERRORS.to_string(),
            messages: string_list(other),
        }],
    };

    Some(ApiError::Validation {
        status: response.status,
        fields,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Strings from a list or a single string; anything else is skipped.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => vec![text.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::error::{FORBIDDEN_MESSAGE, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE};
    use serde_json::json;

    fn failed(status: u16, body: Value) -> FailedResponse {
        FailedResponse::new(status, Some(body))
    }

    #[test]
    fn unauthorized_wins_over_everything() {
        let err = classify(&failed(401, json!({"detail": "Invalid token."})));
        assert_eq!(err, ApiError::Unauthorized);
        assert!(err.messages().is_empty());
    }

    #[test]
    fn forbidden_uses_fixed_message_even_with_detail() {
        let err = classify(&failed(403, json!({"detail": "nope"})));
        assert_eq!(err, ApiError::Forbidden);
        assert_eq!(err.messages(), [FORBIDDEN_MESSAGE]);
    }

    #[test]
    fn detail_wins_over_not_found_and_server_error() {
        let err = classify(&failed(404, json!({"detail": "No such event type."})));
        assert_eq!(err.messages(), ["No such event type."]);

        let err = classify(&failed(503, json!({"detail": "Maintenance window."})));
        assert_eq!(err.messages(), ["Maintenance window."]);

        let err = classify(&failed(429, json!({"detail": "Request was throttled."})));
        assert_eq!(
            err,
            ApiError::Domain {
                status: 429,
                message: "Request was throttled.".to_string()
            }
        );
    }

    #[test]
    fn not_found_without_detail() {
        let err = classify(&FailedResponse::from_raw(404, "<html>missing</html>"));
        assert_eq!(err, ApiError::NotFound);
        assert_eq!(err.messages(), [NOT_FOUND_MESSAGE]);
    }

    #[test]
    fn server_error_beats_error_field() {
        let err = classify(&failed(500, json!({"error": "db down"})));
        assert_eq!(err, ApiError::ServerError { status: 500 });
        assert_eq!(err.messages(), [SERVER_ERROR_MESSAGE]);
    }

    #[test]
    fn error_field_beats_errors_field() {
        let err = classify(&failed(
            400,
            json!({"error": "Slot taken.", "errors": {"start": ["x"]}}),
        ));
        assert_eq!(err.messages(), ["Slot taken."]);
    }

    #[test]
    fn errors_mapping_flattens_in_order() {
        let err = classify(&failed(
            400,
            json!({"errors": {"field1": ["a", "b"], "field2": ["c"]}}),
        ));
        assert_eq!(err.messages(), ["a", "b", "c"]);
        assert_eq!(err.field_messages("field1").map(<[String]>::len), Some(2));
    }

    #[test]
    fn errors_mapping_keeps_server_order_not_alphabetical() {
        let err = classify(&FailedResponse::from_raw(
            400,
            r#"{"errors": {"zeta": ["z"], "alpha": ["a"]}}"#,
        ));
        assert_eq!(err.messages(), ["z", "a"]);
    }

    #[test]
    fn errors_accepts_single_strings_and_bare_lists() {
        let err = classify(&failed(400, json!({"errors": {"email": "taken", "n": 3}})));
        assert_eq!(err.messages(), ["taken"]);

        let err = classify(&failed(422, json!({"errors": ["first", 2, "second"]})));
        assert_eq!(err.messages(), ["first", "second"]);
        assert!(err.field_messages(NON_FIELD_ERRORS).is_some());
    }

    #[test]
    fn null_fields_do_not_match() {
        let err = classify(&failed(400, json!({"detail": null, "error": null})));
        assert!(matches!(err, ApiError::Transport { status: Some(400), .. }));
    }

    #[test]
    fn unrecognised_failure_is_silent() {
        let err = classify(&FailedResponse::new(418, None));
        assert!(matches!(err, ApiError::Transport { status: Some(418), .. }));
        assert!(err.messages().is_empty());
    }

    #[test]
    fn non_string_detail_is_rendered_as_json() {
        let err = classify(&failed(400, json!({"detail": ["one"]})));
        assert_eq!(err.messages(), [r#"["one"]"#]);
    }
}
