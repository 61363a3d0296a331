use thiserror::Error;

/// Top-level error type for the `flowdeck-api` crate.
///
/// Covers every failure mode of a call against the orchestrator:
/// credential exchange, transport, non-success statuses, and bodies that
/// don't match the expected shape. `flowdeck-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No credentials configured, or the token exchange was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status, with the raw response body.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the orchestrator rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Api { status: 401 | 403, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_classification() {
        let not_found = Error::Api {
            status: 404,
            body: String::new(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_transient());
        assert_eq!(not_found.status(), Some(404));

        let unavailable = Error::Api {
            status: 503,
            body: "down".into(),
        };
        assert!(unavailable.is_transient());

        let forbidden = Error::Api {
            status: 403,
            body: String::new(),
        };
        assert!(forbidden.is_auth_failure());
    }

    #[test]
    fn authentication_is_auth_failure() {
        let err = Error::Authentication {
            message: "no credentials configured".into(),
        };
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "Authentication failed: no credentials configured"
        );
    }
}
