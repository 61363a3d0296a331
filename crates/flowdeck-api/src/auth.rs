// Bearer-token lifecycle
//
// Tokens are acquired lazily on the first authenticated call and replaced
// whenever they are within the refresh buffer of their expiry. The
// validity check and the exchange both happen under the client's token
// mutex, so racing callers produce a single exchange request.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;
use tracing::debug;

use crate::client::FlowClient;
use crate::error::Error;

/// Token exchange endpoint (unauthenticated).
pub const TOKEN_PATH: &str = "/auth/token";

/// Safety margin subtracted from expiry before a token is reused.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(60);

/// Lifetime assumed for an exchanged token. The server issues 24h tokens;
/// one hour of headroom keeps us clear of clock skew.
pub const ISSUED_TOKEN_LIFETIME: Duration = Duration::from_secs(23 * 60 * 60);

/// Nominal expiry given once to a statically configured token.
pub const STATIC_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Credentials for authenticating with the orchestrator.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password exchanged at `/auth/token` for a bearer token.
    Basic {
        username: String,
        password: SecretString,
    },
    /// Pre-issued bearer token, treated as always valid.
    StaticToken(SecretString),
    /// Nothing configured. Every authenticated call fails.
    None,
}

impl Credentials {
    pub fn is_static(&self) -> bool {
        matches!(self, Self::StaticToken(_))
    }
}

/// Current bearer token and its absolute expiry.
#[derive(Debug)]
pub(crate) struct TokenState {
    pub(crate) token: Option<SecretString>,
    pub(crate) expiry: Instant,
}

impl TokenState {
    pub(crate) fn empty() -> Self {
        Self {
            token: None,
            expiry: Instant::now(),
        }
    }

    pub(crate) fn issued(token: SecretString, lifetime: Duration) -> Self {
        Self {
            token: Some(token),
            expiry: Instant::now() + lifetime,
        }
    }

    /// A token is usable only while `now + REFRESH_BUFFER < expiry`.
    pub(crate) fn usable(&self, now: Instant) -> Option<&SecretString> {
        self.token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty() && now + REFRESH_BUFFER < self.expiry)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl FlowClient {
    /// Return a usable bearer token, exchanging credentials if needed.
    ///
    /// A static token never triggers an exchange. Otherwise the cached
    /// token is reused until it enters the refresh buffer; after that one
    /// exchange call replaces it, no matter how many callers are waiting.
    pub async fn ensure_token(&self) -> Result<SecretString, Error> {
        let mut state = self.token.lock().await;

        if let Some(token) = state.usable(Instant::now()) {
            return Ok(token.clone());
        }

        if let Credentials::StaticToken(token) = &self.credentials {
            // Static tokens are never refreshed; re-arm the nominal expiry.
            *state = TokenState::issued(token.clone(), STATIC_TOKEN_LIFETIME);
            return Ok(token.clone());
        }

        let Credentials::Basic { username, password } = &self.credentials else {
            return Err(Error::Authentication {
                message: "no credentials configured".into(),
            });
        };
        if username.is_empty() {
            return Err(Error::Authentication {
                message: "no credentials configured".into(),
            });
        }

        let token = self.exchange(username, password).await?;
        *state = TokenState::issued(token.clone(), ISSUED_TOKEN_LIFETIME);
        Ok(token)
    }

    /// Seed a previously issued token with an explicit expiry.
    ///
    /// The next [`ensure_token`](Self::ensure_token) applies the usual
    /// refresh-buffer check against `expires_at`.
    pub async fn install_token(&self, token: SecretString, expires_at: Instant) {
        let mut state = self.token.lock().await;
        *state = TokenState {
            token: Some(token),
            expiry: expires_at,
        };
    }

    /// Expiry of the cached token, if one has been acquired.
    pub async fn token_expiry(&self) -> Option<Instant> {
        let state = self.token.lock().await;
        state.token.as_ref().map(|_| state.expiry)
    }

    async fn exchange(&self, username: &str, password: &SecretString) -> Result<SecretString, Error> {
        let url = self.url(TOKEN_PATH)?;
        debug!("exchanging credentials at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token exchange rejected (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("token response: {e}"),
                body: body.clone(),
            }
        })?;

        debug!("token exchange successful");
        Ok(SecretString::from(parsed.access_token))
    }
}
