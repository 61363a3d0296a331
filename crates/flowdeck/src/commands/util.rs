//! Shared helpers for command handlers.

use std::io::IsTerminal;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, refuses instead of blocking.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a `--conf` argument. Must be a JSON object.
pub fn parse_conf(raw: Option<&str>) -> Result<Option<Value>, CliError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "conf".into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(Some(value))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>, CliError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CliError::Validation {
            field: field.into(),
            reason: format!("expected RFC 3339 or YYYY-MM-DD, got '{raw}'"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_both_forms() {
        let day = parse_date("from", "2025-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-03-01T00:00:00+00:00");

        let ts = parse_date("from", "2025-03-01T06:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-01T04:30:00+00:00");

        assert!(matches!(
            parse_date("to", "yesterday"),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn conf_must_be_an_object() {
        assert_eq!(parse_conf(None).unwrap(), None);
        assert!(parse_conf(Some(r#"{"full": true}"#)).unwrap().is_some());
        assert!(matches!(
            parse_conf(Some("[1, 2]")),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(parse_conf(Some("{")), Err(CliError::Json(_))));
    }
}
