//! Client error type.

use serde::Deserialize;
use thiserror::Error;

/// Errors from [`crate::ApiClient`] and the stores built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    SignedOut,
}

impl ClientError {
    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server reported a duplicate (409).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a status and raw body, tolerating
    /// bodies that are not the server's error envelope (proxies, timeouts).
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self::Api {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => Self::Api {
                status,
                code: "unknown".to_owned(),
                message: body.chars().take(200).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_is_decoded() {
        let err = ClientError::from_body(
            409,
            r#"{"error":{"code":"conflict","message":"이미 찜한 가게입니다."}}"#,
        );
        assert!(err.is_conflict());
        assert!(matches!(err, ClientError::Api { ref code, .. } if code == "conflict"));
    }

    #[test]
    fn test_foreign_body_is_kept_as_message() {
        let err = ClientError::from_body(502, "Bad Gateway");
        match err {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 502);
                assert_eq!(code, "unknown");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
