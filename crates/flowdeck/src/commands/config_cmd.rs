//! Config subcommand handlers. None of these talk to the orchestrator.

use dialoguer::{Input, Password};

use flowdeck_config::{AuthType, KEYRING_SERVICE};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into `CliError`.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn keyring_err(e: &keyring::Error) -> CliError {
    CliError::Config {
        message: format!("keyring unavailable: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = cfg.to_redacted_toml()?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(flowdeck_config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load(global)?;
            let orchestrator = &cfg.orchestrator;
            if orchestrator.auth.kind == AuthType::Token {
                return Err(CliError::Validation {
                    field: "orchestrator.auth.type".into(),
                    reason: "token auth does not use a stored password".into(),
                });
            }

            let url = flowdeck_config::parse_base_url(&orchestrator.base_url)?;
            let host = url.host_str().unwrap_or_default();

            let username = match orchestrator.auth.username.clone() {
                Some(u) if !u.is_empty() => u,
                _ => Input::<String>::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(prompt_err)?,
            };
            let password = Password::new()
                .with_prompt(format!("Password for {username}@{host}"))
                .interact()
                .map_err(prompt_err)?;

            let account = flowdeck_config::keyring_account(&username, host);
            let entry =
                keyring::Entry::new(KEYRING_SERVICE, &account).map_err(|e| keyring_err(&e))?;
            entry
                .set_password(&password)
                .map_err(|e| keyring_err(&e))?;

            if !global.quiet {
                eprintln!("Password for {account} stored in the system keyring");
            }
            Ok(())
        }
    }
}
