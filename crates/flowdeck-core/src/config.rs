// ── Runtime dashboard configuration ──
//
// These types describe how to reach an orchestrator and how often to poll
// it. They carry credential data and timing, but never touch disk. The CLI
// resolves a `DashboardConfig` from files and environment and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

pub use flowdeck_api::TlsMode;

/// How to authenticate with the orchestrator.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username/password, exchanged for a bearer token on first use.
    Basic {
        username: String,
        password: SecretString,
    },
    /// Pre-issued bearer token.
    Token(SecretString),
    /// No credentials. Every authenticated request fails.
    Anonymous,
}

impl From<AuthCredentials> for flowdeck_api::Credentials {
    fn from(auth: AuthCredentials) -> Self {
        match auth {
            AuthCredentials::Basic { username, password } => Self::Basic { username, password },
            AuthCredentials::Token(token) => Self::StaticToken(token),
            AuthCredentials::Anonymous => Self::None,
        }
    }
}

/// Poll cadence per entity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub workflows: Duration,
    pub runs: Duration,
    pub tasks: Duration,
    /// Reserved for a log-tailing view; the core loops don't use it.
    pub logs: Duration,
    pub health: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            workflows: Duration::from_secs(5),
            runs: Duration::from_secs(3),
            tasks: Duration::from_secs(2),
            logs: Duration::from_secs(1),
            health: Duration::from_secs(10),
        }
    }
}

/// Default advisory freshness window for cached entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Everything the [`Dashboard`](crate::Dashboard) needs to run.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Orchestrator base URL, e.g. `http://localhost:8080`.
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsMode,
    /// Bounded per-request timeout.
    pub timeout: Duration,
    pub intervals: PollIntervals,
    pub cache_ttl: Duration,
    /// Minimum spacing between two outbound requests.
    pub request_pace: Duration,
}

impl DashboardConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsMode::System,
            timeout: flowdeck_api::transport::DEFAULT_TIMEOUT,
            intervals: PollIntervals::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_pace: flowdeck_api::pacer::DEFAULT_PACE,
        }
    }
}
