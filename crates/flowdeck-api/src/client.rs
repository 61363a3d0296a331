// Airflow REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL path construction, request
// pacing, bearer-token attachment, and status/JSON handling. Endpoint
// helpers live in sibling modules as inherent methods so this module
// stays focused on transport mechanics.

use reqwest::Method;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::auth::{Credentials, STATIC_TOKEN_LIFETIME, TokenState};
use crate::error::Error;
use crate::pacer::Pacer;
use crate::transport::TransportConfig;

/// Pagination and ordering for list endpoints.
///
/// Zero/empty fields are omitted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: u32,
    pub offset: u32,
    pub order_by: Option<String>,
}

impl ListOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.limit > 0 {
            params.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            params.push(("offset", self.offset.to_string()));
        }
        if let Some(order_by) = self.order_by.as_deref().filter(|o| !o.is_empty()) {
            params.push(("order_by", order_by.to_owned()));
        }
        params
    }
}

/// Authenticated client for the orchestrator's REST API.
///
/// Every call waits on a shared [`Pacer`], obtains a bearer token via
/// [`ensure_token`](Self::ensure_token), and fails with
/// [`Error::Api`] on any non-success status.
pub struct FlowClient {
    http: reqwest::Client,
    base_url: Url,
    pub(crate) credentials: Credentials,
    pub(crate) token: Mutex<TokenState>,
    pacer: Pacer,
}

impl FlowClient {
    /// Create a client from a base URL, credentials, and transport config.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        let token = match &credentials {
            Credentials::StaticToken(token) => {
                TokenState::issued(token.clone(), STATIC_TOKEN_LIFETIME)
            }
            Credentials::Basic { .. } | Credentials::None => TokenState::empty(),
        };

        Self {
            http,
            base_url,
            credentials,
            token: Mutex::new(token),
            pacer: Pacer::default(),
        }
    }

    /// Replace the request pacer (e.g. to change the spacing).
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The orchestrator base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append an absolute API path to the base URL, keeping any path
    /// prefix the base URL carries (e.g. a reverse-proxy mount point).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Pace, authenticate, and start building a request.
    async fn authorized(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, Error> {
        self.pacer.wait().await;
        let token = self.ensure_token().await?;
        debug!("{method} {url}");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret()))
    }

    /// Send a GET request and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&ListOptions>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let query = opts.map(ListOptions::to_query).unwrap_or_default();

        let resp = self
            .authorized(Method::GET, url)
            .await?
            .header(ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;

        handle_response(resp).await
    }

    /// Send a GET request and return the body as text.
    pub async fn get_text(&self, path: &str) -> Result<String, Error> {
        let url = self.url(path)?;

        let resp = self
            .authorized(Method::GET, url)
            .await?
            .header(ACCEPT, "text/plain")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }
        Ok(resp.text().await?)
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;

        let resp = self
            .authorized(Method::POST, url)
            .await?
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        handle_response(resp).await
    }

    /// Send a PATCH request with a JSON body and decode the JSON response.
    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;

        let resp = self
            .authorized(Method::PATCH, url)
            .await?
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        handle_response(resp).await
    }

    /// Send a PATCH request, checking only the status.
    pub async fn patch_no_content<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;

        let resp = self
            .authorized(Method::PATCH, url)
            .await?
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(parse_error(status, resp).await)
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        body,
    }
}
