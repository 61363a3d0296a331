//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use flowdeck_config::ConfigError;
use flowdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to orchestrator at {url}")]
    #[diagnostic(
        code(flowdeck::connection_failed),
        help(
            "Check that the API server is running and reachable.\n\
             Reason: {reason}\n\
             Try: flowdeck health --url {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(flowdeck::timeout),
        help("Raise orchestrator.timeout in the config or check server load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(flowdeck::auth_failed),
        help(
            "Verify the username and password, or the token.\n\
             Store a password with: flowdeck config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured")]
    #[diagnostic(
        code(flowdeck::no_credentials),
        help(
            "{reason}.\n\
             Set AIRFLOW_USERNAME and AIRFLOW_PASSWORD, AIRFLOW_TOKEN, or\n\
             [orchestrator.auth] in the config file."
        )
    )]
    NoCredentials { reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(flowdeck::not_found),
        help("Run: flowdeck {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(flowdeck::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response from orchestrator: {message}")]
    #[diagnostic(
        code(flowdeck::decode),
        help("The server may run an unsupported Airflow version (flowdeck targets API v2).")
    )]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(flowdeck::validation))]
    Validation { field: String, reason: String },

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(flowdeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(flowdeck::config),
        help("Show the effective configuration with: flowdeck config show")
    )]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(flowdeck::json), help("Pass a JSON object, e.g. '{{\"key\": 1}}'."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(flowdeck::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Json(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::WorkflowNotFound { workflow_id } => Self::NotFound {
                resource_type: "workflow".into(),
                identifier: workflow_id,
                list_command: "workflows list".into(),
            },
            CoreError::NotFound { resource } => Self::NotFound {
                resource_type: "resource".into(),
                identifier: resource,
                list_command: "workflows list".into(),
            },
            CoreError::Decode { message } => Self::Decode { message },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { status, message } => Self::ApiError { status, message },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { reason } => Self::NoCredentials { reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let cases = [
            (CoreError::Timeout, exit_code::TIMEOUT),
            (
                CoreError::AuthenticationFailed {
                    message: "nope".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::WorkflowNotFound {
                    workflow_id: "etl".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::ConnectionFailed {
                    url: "http://x".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::ValidationFailed {
                    message: "bad".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::Api {
                    status: 500,
                    message: "boom".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }
}
