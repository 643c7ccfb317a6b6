use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed - please log in again ({0})")]
    Auth(String),

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape returned by the backend (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::Http {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.is_auth() || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Human-readable message from a backend error body, when it has one.
    pub fn detail(&self) -> Option<String> {
        let ApiError::Http { body, .. } = self else {
            return None;
        };
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail {
            serde_json::Value::String(s) => Some(s),
            // Validation errors come back as a list of objects with a `msg` field
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}
