//! Health, connections, variables and orchestrator settings.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use flowdeck_core::{ConfigSection, Connection, Dashboard, HealthSnapshot, Variable};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Component")]
    component: &'static str,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Heartbeat")]
    heartbeat: String,
}

fn health_rows(health: &HealthSnapshot) -> Vec<HealthRow> {
    health
        .components()
        .into_iter()
        .filter_map(|(component, c)| {
            c.map(|c| HealthRow {
                component,
                status: output::or_dash(c.status.as_deref()),
                heartbeat: output::timestamp(c.latest_heartbeat),
            })
        })
        .collect()
}

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    conn_type: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Login")]
    login: String,
}

impl From<&Connection> for ConnectionRow {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id.clone(),
            conn_type: output::or_dash(c.conn_type.as_deref()),
            host: output::or_dash(c.host.as_deref()),
            port: c.port.map_or_else(|| "-".into(), |p| p.to_string()),
            login: output::or_dash(c.login.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Variable> for VariableRow {
    fn from(v: &Variable) -> Self {
        Self {
            key: v.key.clone(),
            value: output::or_dash(v.value.as_deref()),
            description: output::or_dash(v.description.as_deref()),
        }
    }
}

#[derive(Clone, Tabled, Serialize)]
struct SettingRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn setting_rows(sections: &[ConfigSection]) -> Vec<SettingRow> {
    sections
        .iter()
        .flat_map(|s| {
            s.options.iter().map(|(key, value)| SettingRow {
                section: s.name.clone(),
                key: key.clone(),
                value: value.clone(),
            })
        })
        .collect()
}

fn verdict(healthy: bool, color: bool) -> String {
    match (healthy, color) {
        (true, true) => "all components healthy".green().to_string(),
        (true, false) => "all components healthy".into(),
        (false, true) => "unhealthy components reported".red().to_string(),
        (false, false) => "unhealthy components reported".into(),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn health(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let health = dashboard.fetch_health().await?;
    let color = output::should_color(&global.color);

    let out = output::render_single(
        &global.output,
        &health,
        |h| {
            let rows = health_rows(h);
            let table = tabled::Table::new(&rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            format!("{table}\n{}", verdict(h.all_healthy(), color))
        },
        |h| {
            health_rows(h)
                .iter()
                .map(|r| format!("{}={}", r.component, r.status))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn connections(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let connections = dashboard.connections().await?;
    let out = output::render_list(
        &global.output,
        &connections,
        |c| ConnectionRow::from(c),
        |c| c.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn variables(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let variables = dashboard.variables().await?;
    let out = output::render_list(
        &global.output,
        &variables,
        |v| VariableRow::from(v),
        |v| v.key.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn settings(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let sections = dashboard.orchestrator_config().await?;
    let rows = setting_rows(&sections);
    let out = output::render_list(
        &global.output,
        &rows,
        SettingRow::clone,
        |r| format!("{}.{}={}", r.section, r.key, r.value),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
