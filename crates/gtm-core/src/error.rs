//! Error taxonomy and normalization into tool diagnostics

use serde::Deserialize;
use thiserror::Error;
use tracing::error;

/// Name of the tool that clears stale session credentials
pub const REMOVE_SESSION_DATA_TOOL: &str = "gtm_remove_session_data";

/// Errors raised while serving a Tag Manager tool call
#[derive(Error, Debug)]
pub enum GtmError {
    /// A required parameter for the chosen action is missing or out of range
    #[error("{0}")]
    Validation(String),

    #[error("fingerprint is required for update action. The existing tag {tag_id} does not have a fingerprint, so you must provide one.")]
    MissingFingerprint { tag_id: String },

    #[error(transparent)]
    Remote(#[from] RemoteFault),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GtmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// A failure reported by the Tag Manager API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Google API Error {code} - {}", .messages.join(". "))]
pub struct RemoteFault {
    pub code: u16,
    pub messages: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    #[serde(default)]
    message: Option<String>,
}

impl RemoteFault {
    /// Decode a Google error envelope. Falls back to the raw body, then to
    /// `fallback` (usually the HTTP reason phrase) when the body is empty.
    pub fn from_response(status: u16, body: &str, fallback: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            let ErrorBody { code, message, errors } = envelope.error;
            let mut messages: Vec<String> = errors.into_iter().filter_map(|e| e.message).collect();
            if messages.is_empty() {
                messages.extend(message);
            }
            return Self {
                code: code.unwrap_or(status),
                messages,
            };
        }

        let body = body.trim();
        let message = if body.is_empty() { fallback } else { body };
        Self {
            code: status,
            messages: vec![message.to_string()],
        }
    }
}

/// Uniform error-shaped tool output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub is_error: bool,
    pub display_text: String,
}

/// Turn any failure into a user-facing diagnostic. Never fails.
pub fn normalize(context: &str, fault: &GtmError) -> NormalizedError {
    let display_text = match fault {
        GtmError::Remote(RemoteFault { code: 401, .. }) => format!(
            "It seems that your token has been expired, please use {} tool to clear your session in the MCP client",
            REMOVE_SESSION_DATA_TOOL
        ),
        // RemoteFault renders as "Google API Error {code} - {messages}"
        other => format!("{}: {}", context, other),
    };

    error!("MCP tool error: {}", display_text);

    NormalizedError {
        is_error: true,
        display_text,
    }
}
