use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Field-keyed validation messages, as returned in a 422 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failure of a fetch or mutation against the backend.
///
/// Cloneable so cache entries can keep the last error next to the pages they
/// already hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("validation failed: {message}")]
    Validation { message: String, errors: FieldErrors },
    #[error("unauthenticated: {0}")]
    Auth(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("unexpected page: requested {expected}, received {actual}")]
    InvalidPage { expected: u32, actual: u32 },
    #[error("malformed pagination metadata: {0}")]
    InvalidMeta(String),
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Error body shapes the backend produces.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.clone()]);
        Self::Validation { message, errors }
    }

    /// Build the error for a non-success response from its status and raw body.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let fallback = || {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        };

        match status {
            StatusCode::UNAUTHORIZED => Self::Auth(parsed.message.unwrap_or_else(fallback)),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Validation {
                message: parsed.message.unwrap_or_else(fallback),
                errors: parsed.errors.unwrap_or_default(),
            },
            _ => Self::Server {
                status: status.as_u16(),
                message: parsed.message.unwrap_or_else(fallback),
            },
        }
    }

    /// Every message worth showing to a user, field messages first.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { message, errors } if !errors.is_empty() => {
                let mut out: Vec<String> = errors.values().flatten().cloned().collect();
                if out.is_empty() {
                    out.push(message.clone());
                }
                out
            }
            other => vec![other.to_string()],
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
