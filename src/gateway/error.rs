use thiserror::Error;

pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Messages reported by the server for one input field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

/// A classified gateway failure.
///
/// Classification and its side effects have already run by the time a caller
/// sees one of these; callers only decide how to continue.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401. The session has been cleared and the host sent to the login page.
    #[error("session expired")]
    Unauthorized,
    #[error("permission denied")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("server error ({status})")]
    ServerError { status: u16 },
    /// Field-keyed messages, in the order the server sent them.
    #[error("validation failed: {}", flatten(.fields).join("; "))]
    Validation { status: u16, fields: Vec<FieldErrors> },
    /// A single `detail` or `error` message from the server.
    #[error("{message}")]
    Domain { status: u16, message: String },
    /// No classifiable response. Never notified.
    #[error("request failed: {message}")]
    Transport { status: Option<u16>, message: String },
    /// The call requires a token and none is held. Nothing was sent.
    #[error("no credentials available for an authenticated request")]
    MissingToken,
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ApiError {
    /// User-facing messages for this failure, one notification each.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Forbidden => vec![FORBIDDEN_MESSAGE.to_string()],
            Self::NotFound => vec![NOT_FOUND_MESSAGE.to_string()],
            Self::ServerError { .. } => vec![SERVER_ERROR_MESSAGE.to_string()],
            Self::Validation { fields, .. } => flatten(fields),
            Self::Domain { message, .. } => vec![message.clone()],
            Self::Unauthorized | Self::Transport { .. } | Self::MissingToken | Self::Encode(_) => {
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::ServerError { status }
            | Self::Validation { status, .. }
            | Self::Domain { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            Self::MissingToken | Self::Encode(_) => None,
        }
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Messages for `field`, if the server reported any.
    #[must_use]
    pub fn field_messages(&self, field: &str) -> Option<&[String]> {
        match self {
            Self::Validation { fields, .. } => fields
                .iter()
                .find(|entry| entry.field == field)
                .map(|entry| entry.messages.as_slice()),
            _ => None,
        }
    }
}

fn flatten(fields: &[FieldErrors]) -> Vec<String> {
    fields
        .iter()
        .flat_map(|entry| entry.messages.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_kinds_have_no_messages() {
        assert!(ApiError::Unauthorized.messages().is_empty());
        assert!(ApiError::MissingToken.messages().is_empty());
        assert!(ApiError::Transport {
            status: None,
            message: "connection refused".to_string()
        }
        .messages()
        .is_empty());
    }

    #[test]
    fn validation_flattens_in_field_then_list_order() {
        let err = ApiError::Validation {
            status: 400,
            fields: vec![
                FieldErrors {
                    field: "email".to_string(),
                    messages: vec!["a".to_string(), "b".to_string()],
                },
                FieldErrors {
                    field: "password".to_string(),
                    messages: vec!["c".to_string()],
                },
            ],
        };
        assert_eq!(err.messages(), ["a", "b", "c"]);
        assert_eq!(err.field_messages("password"), Some(&["c".to_string()][..]));
        assert_eq!(err.field_messages("name"), None);
        assert_eq!(err.to_string(), "validation failed: a; b; c");
    }

    #[test]
    fn status_reflects_kind() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert_eq!(ApiError::ServerError { status: 503 }.status(), Some(503));
        assert_eq!(ApiError::MissingToken.status(), None);
    }
}
