//! Configuration for flowdeck.
//!
//! TOML file, `FLOWDECK_`-prefixed environment (`__` separates nesting),
//! the conventional `AIRFLOW_*` variables, credential resolution (plaintext
//! or env, then keyring), and translation to `flowdeck_core::DashboardConfig`.
//! The CLI applies its own flag overrides on top of the loaded [`Config`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use flowdeck_core::{AuthCredentials, DashboardConfig, PollIntervals, TlsMode};

/// Prefix of environment variables merged over the file.
pub const ENV_PREFIX: &str = "FLOWDECK_";

/// Keyring service name; entries are keyed `<username>@<host>`.
pub const KEYRING_SERVICE: &str = "flowdeck";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured: {reason}")]
    NoCredentials { reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: Orchestrator,

    #[serde(default)]
    pub ui: Ui,
}

/// Where the orchestrator lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Orchestrator {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, humantime (e.g. "30s").
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Extra CA certificate (PEM) to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub auth: Auth,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            ca_cert: None,
            insecure: false,
            auth: Auth::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_timeout() -> String {
    "30s".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Username/password exchanged for a short-lived token.
    #[default]
    Basic,
    /// Pre-issued bearer token.
    Token,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Auth {
    #[serde(rename = "type", default)]
    pub kind: AuthType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Plaintext password. Prefer `AIRFLOW_PASSWORD` or the keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ui {
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub refresh_intervals: RefreshIntervals,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            refresh_intervals: RefreshIntervals::default(),
        }
    }
}

fn default_theme() -> String {
    "dark".into()
}

/// Poll cadences as humantime strings. Unparsable values fall back to
/// the default with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshIntervals {
    #[serde(alias = "dags")]
    pub workflows: String,
    pub runs: String,
    pub tasks: String,
    pub logs: String,
    pub health: String,
    pub cache_ttl: String,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            workflows: "5s".into(),
            runs: "3s".into(),
            tasks: "2s".into(),
            logs: "1s".into(),
            health: "10s".into(),
            cache_ttl: "5s".into(),
        }
    }
}

impl RefreshIntervals {
    pub fn poll_intervals(&self) -> PollIntervals {
        let defaults = PollIntervals::default();
        PollIntervals {
            workflows: parse_duration("workflows", &self.workflows, defaults.workflows),
            runs: parse_duration("runs", &self.runs, defaults.runs),
            tasks: parse_duration("tasks", &self.tasks, defaults.tasks),
            logs: parse_duration("logs", &self.logs, defaults.logs),
            health: parse_duration("health", &self.health, defaults.health),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        parse_duration("cache_ttl", &self.cache_ttl, flowdeck_core::DEFAULT_CACHE_TTL)
    }
}

impl Config {
    /// Render as TOML with password and token masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        let auth = &mut shown.orchestrator.auth;
        if auth.password.is_some() {
            auth.password = Some(REDACTED.into());
        }
        if auth.token.is_some() {
            auth.token = Some(REDACTED.into());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

/// Parse a humantime duration, falling back to `default` on error.
pub fn parse_duration(field: &str, raw: &str, default: Duration) -> Duration {
    match humantime::parse_duration(raw.trim()) {
        Ok(d) => d,
        Err(e) => {
            warn!(field, value = raw, error = %e, ?default, "invalid duration, using default");
            default
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "flowdeck", "flowdeck").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("flowdeck");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the default path) plus the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load the config, reading `AIRFLOW_*` overrides through `lookup`.
///
/// Precedence: defaults < file < `FLOWDECK_*` < `AIRFLOW_*`. A missing
/// default file is not an error; a missing explicit `path` is.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = path {
        if !explicit.is_file() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", explicit.display()),
            )));
        }
    }
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading config");

    let mut config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    apply_airflow_env(&mut config, lookup);
    Ok(config)
}

fn apply_airflow_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let orchestrator = &mut config.orchestrator;

    if let Some(url) = get("AIRFLOW_BASE_URL") {
        orchestrator.base_url = url;
    }
    if let Some(username) = get("AIRFLOW_USERNAME") {
        orchestrator.auth.username = Some(username);
    }
    if let Some(password) = get("AIRFLOW_PASSWORD") {
        orchestrator.auth.password = Some(password);
    }
    if let Some(token) = get("AIRFLOW_TOKEN") {
        orchestrator.auth.token = Some(token);
        orchestrator.auth.kind = AuthType::Token;
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve credentials for `host`.
///
/// A non-empty token wins whatever the auth type says. Otherwise basic
/// auth takes the password from the config (which already includes
/// `AIRFLOW_PASSWORD`), then the keyring. With neither, an empty password
/// is sent and the server decides.
pub fn resolve_auth(auth: &Auth, host: &str) -> Result<AuthCredentials, ConfigError> {
    let token = auth.token.clone().filter(|t| !t.is_empty());
    match auth.kind {
        AuthType::Token => {
            let token = token.ok_or_else(|| ConfigError::NoCredentials {
                reason: "auth type is 'token' but no token is set".into(),
            })?;
            Ok(AuthCredentials::Token(SecretString::from(token)))
        }
        AuthType::Basic => {
            if let Some(token) = token {
                debug!("token configured, using it instead of basic credentials");
                return Ok(AuthCredentials::Token(SecretString::from(token)));
            }

            let username = auth
                .username
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| ConfigError::NoCredentials {
                    reason: "auth type is 'basic' but no username is set".into(),
                })?;

            let password = auth
                .password
                .clone()
                .or_else(|| keyring_password(&username, host))
                .unwrap_or_else(|| {
                    warn!(%username, host, "no password configured, sending an empty one");
                    String::new()
                });

            Ok(AuthCredentials::Basic {
                username,
                password: SecretString::from(password),
            })
        }
    }
}

/// Keyring account under which the password for `username` on `host` is
/// stored.
pub fn keyring_account(username: &str, host: &str) -> String {
    format!("{username}@{host}")
}

fn keyring_password(username: &str, host: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(username, host)).ok()?;
    match entry.get_password() {
        Ok(pw) => Some(pw),
        Err(e) => {
            debug!(error = %e, "keyring lookup failed");
            None
        }
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Validate the config and build the core's runtime config.
pub fn to_dashboard_config(config: &Config) -> Result<DashboardConfig, ConfigError> {
    let orchestrator = &config.orchestrator;
    let url = parse_base_url(&orchestrator.base_url)?;
    let host = url.host_str().unwrap_or_default().to_owned();
    let auth = resolve_auth(&orchestrator.auth, &host)?;

    let tls = if orchestrator.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = orchestrator.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    let intervals = &config.ui.refresh_intervals;
    let mut dashboard = DashboardConfig::new(url, auth);
    dashboard.tls = tls;
    dashboard.timeout = parse_duration("timeout", &orchestrator.timeout, dashboard.timeout);
    dashboard.intervals = intervals.poll_intervals();
    dashboard.cache_ttl = intervals.cache_ttl();
    Ok(dashboard)
}

/// Parse and check `orchestrator.base_url`. Only http and https are
/// accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "orchestrator.base_url".into(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(format!("{e}: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().display().to_string();
            jail.set_env("HOME", &dir);
            jail.set_env("XDG_CONFIG_HOME", &dir);

            let config = load_config_with(None, no_env).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.orchestrator.base_url, "http://localhost:8080");
            assert_eq!(config.orchestrator.auth.kind, AuthType::Basic);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = load_config_with(Some(Path::new("absent.toml")), no_env).unwrap_err();
            assert!(matches!(err, ConfigError::Io(_)));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [orchestrator]
                base_url = "http://airflow.internal:8080"
                timeout = "10s"

                [orchestrator.auth]
                username = "ops"

                [ui.refresh_intervals]
                dags = "7s"
                "#,
            )?;
            jail.set_env("FLOWDECK_ORCHESTRATOR__TIMEOUT", "45s");

            let config = load_config_with(Some(Path::new("config.toml")), no_env).unwrap();
            assert_eq!(config.orchestrator.base_url, "http://airflow.internal:8080");
            assert_eq!(config.orchestrator.timeout, "45s");
            assert_eq!(config.orchestrator.auth.username.as_deref(), Some("ops"));
            assert_eq!(config.ui.refresh_intervals.workflows, "7s");
            assert_eq!(config.ui.refresh_intervals.runs, "3s");
            Ok(())
        });
    }

    #[test]
    fn airflow_token_switches_auth_type() {
        let env: HashMap<&str, &str> = [
            ("AIRFLOW_BASE_URL", "https://af.example.com"),
            ("AIRFLOW_TOKEN", "t0k"),
            ("AIRFLOW_USERNAME", ""),
        ]
        .into();
        let mut config = Config::default();
        apply_airflow_env(&mut config, |k| env.get(k).map(|v| (*v).to_owned()));

        assert_eq!(config.orchestrator.base_url, "https://af.example.com");
        assert_eq!(config.orchestrator.auth.kind, AuthType::Token);
        assert_eq!(config.orchestrator.auth.username, None, "empty values are ignored");

        let dashboard = to_dashboard_config(&config).unwrap();
        assert!(matches!(dashboard.auth, AuthCredentials::Token(ref t) if t.expose_secret() == "t0k"));
    }

    #[test]
    fn translates_intervals_tls_and_credentials() {
        let mut config = Config::default();
        config.orchestrator.insecure = true;
        config.orchestrator.timeout = "12s".into();
        config.orchestrator.auth.username = Some("admin".into());
        config.orchestrator.auth.password = Some("secret".into());
        config.ui.refresh_intervals.health = "1m".into();
        config.ui.refresh_intervals.tasks = "soon".into();

        let dashboard = to_dashboard_config(&config).unwrap();
        assert_eq!(dashboard.timeout, Duration::from_secs(12));
        assert_eq!(dashboard.intervals.health, Duration::from_secs(60));
        assert_eq!(dashboard.intervals.tasks, Duration::from_secs(2), "bad value falls back");
        assert!(matches!(dashboard.tls, TlsMode::DangerAcceptInvalid));
        match dashboard.auth {
            AuthCredentials::Basic { username, password } => {
                assert_eq!(username, "admin");
                assert_eq!(password.expose_secret(), "secret");
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn missing_credentials_are_reported() {
        let config = Config::default();
        assert!(matches!(
            to_dashboard_config(&config),
            Err(ConfigError::NoCredentials { .. })
        ));

        let mut config = Config::default();
        config.orchestrator.auth.kind = AuthType::Token;
        config.orchestrator.auth.username = Some("admin".into());
        assert!(matches!(
            to_dashboard_config(&config),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn token_is_used_even_when_type_is_basic() {
        let auth = Auth {
            kind: AuthType::Basic,
            username: Some("admin".into()),
            password: Some("hunter2".into()),
            token: Some("pat".into()),
        };
        match resolve_auth(&auth, "airflow").unwrap() {
            AuthCredentials::Token(token) => assert_eq!(token.expose_secret(), "pat"),
            other => panic!("expected token auth, got {other:?}"),
        }

        let auth = Auth {
            token: Some(String::new()),
            ..auth
        };
        assert!(matches!(
            resolve_auth(&auth, "airflow").unwrap(),
            AuthCredentials::Basic { ref username, .. } if username == "admin"
        ));
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = Config::default();
        config.orchestrator.base_url = "ftp://airflow".into();
        config.orchestrator.auth.kind = AuthType::Token;
        config.orchestrator.auth.token = Some("x".into());

        let err = to_dashboard_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "orchestrator.base_url"));
    }

    #[test]
    fn redacted_toml_masks_secrets() {
        let mut config = Config::default();
        config.orchestrator.auth.password = Some("hunter2".into());
        config.orchestrator.auth.token = Some("abc".into());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("abc"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[orchestrator.auth]"));
    }
}
