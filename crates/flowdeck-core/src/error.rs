// ── Core error types ──
//
// User-facing errors from flowdeck-core. Consumers never match on HTTP
// transport details directly; the `From<flowdeck_api::Error>` impl
// translates them into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to orchestrator at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to orchestrator timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unexpected response from orchestrator: {message}")]
    Decode { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// HTTP status behind this error, where one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } | Self::WorkflowNotFound { .. } => Some(404),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<flowdeck_api::Error> for CoreError {
    fn from(err: flowdeck_api::Error) -> Self {
        match err {
            flowdeck_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            flowdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        status: e.status().map_or(0, |s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            flowdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            flowdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            flowdeck_api::Error::Api { status: 401 | 403, body } => {
                CoreError::AuthenticationFailed {
                    message: if body.is_empty() {
                        "access denied".into()
                    } else {
                        body
                    },
                }
            }
            flowdeck_api::Error::Api { status: 404, body } => CoreError::NotFound { resource: body },
            flowdeck_api::Error::Api { status, body } => CoreError::Api {
                status,
                message: body,
            },
            flowdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}
