//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use flowdeck_core::{RunState, TaskState};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn run_state(state: RunState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        RunState::Success => label.green().to_string(),
        RunState::Failed => label.red().to_string(),
        RunState::Running => label.cyan().to_string(),
        RunState::Queued => label.yellow().to_string(),
        _ => label.dimmed().to_string(),
    }
}

pub fn task_state(state: TaskState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        TaskState::Success => label.green().to_string(),
        TaskState::Failed | TaskState::UpstreamFailed => label.red().to_string(),
        TaskState::Running | TaskState::Restarting => label.cyan().to_string(),
        TaskState::Queued
        | TaskState::Scheduled
        | TaskState::UpForRetry
        | TaskState::UpForReschedule
        | TaskState::Deferred => label.yellow().to_string(),
        _ => label.dimmed().to_string(),
    }
}

// ── Cell helpers ─────────────────────────────────────────────────────

/// `YYYY-MM-DD HH:MM:SS`, or `-`.
pub fn timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Whole-second humantime rendering, or `-`.
pub fn duration(d: Option<chrono::Duration>) -> String {
    d.and_then(|d| d.to_std().ok())
        .map_or_else(
            || "-".into(),
            |d| humantime::format_duration(std::time::Duration::from_secs(d.as_secs())).to_string(),
        )
}

pub fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_owned()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the data itself via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single item. Table output uses `detail_fn` since detail views
/// are key/value text rather than a `Tabled` row.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_fall_back_to_dash() {
        assert_eq!(timestamp(None), "-");
        assert_eq!(duration(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(duration(Some(chrono::Duration::milliseconds(90_500))), "1m 30s");
    }

    #[test]
    fn uncolored_state_is_plain_label() {
        assert_eq!(run_state(RunState::Success, false), "success");
        assert_eq!(task_state(TaskState::UpForRetry, false), "up_for_retry");
    }
}
