//! Config resolution with CLI flag overrides layered on top of
//! `flowdeck_config` (defaults < file < env < flags).

use flowdeck_config::{AuthType, Config};
use flowdeck_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load file + environment, then apply global flags.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = flowdeck_config::load_config(global.config.as_deref())?;
    apply_flags(&mut config, global);
    Ok(config)
}

/// Resolve everything a [`flowdeck_core::Dashboard`] needs.
pub fn dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let config = load(global)?;
    Ok(flowdeck_config::to_dashboard_config(&config)?)
}

fn apply_flags(config: &mut Config, global: &GlobalOpts) {
    let orchestrator = &mut config.orchestrator;
    if let Some(ref url) = global.url {
        orchestrator.base_url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        orchestrator.auth.username = Some(username.clone());
        orchestrator.auth.kind = AuthType::Basic;
    }
    if let Some(ref token) = global.token {
        orchestrator.auth.token = Some(token.clone());
        orchestrator.auth.kind = AuthType::Token;
    }
    if global.insecure {
        orchestrator.insecure = true;
    }
}
