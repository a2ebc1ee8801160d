use crate::{Error, ErrorContext, Result};
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;

/// Client tuning for [`HttpTransport`].
///
/// Environment overrides (see [`HttpOptions::from_env`]):
/// - `SK_HTTP_TIMEOUT_SECS` (default 120, must be > 0)
/// - `SK_HTTP_POOL_MAX_IDLE_PER_HOST` (default 8)
/// - `SK_PROXY_URL` (unset by default)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub proxy_url: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            proxy_url: None,
        }
    }
}

impl HttpOptions {
    /// Read options from the process environment. Malformed values are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read options through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(raw) = non_empty(lookup("SK_HTTP_TIMEOUT_SECS")) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid_env("SK_HTTP_TIMEOUT_SECS", &raw, "a positive integer"))?;
            options.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = non_empty(lookup("SK_HTTP_POOL_MAX_IDLE_PER_HOST")) {
            options.pool_max_idle_per_host = raw.trim().parse::<usize>().map_err(|_| {
                invalid_env("SK_HTTP_POOL_MAX_IDLE_PER_HOST", &raw, "a non-negative integer")
            })?;
        }

        if let Some(raw) = non_empty(lookup("SK_PROXY_URL")) {
            Proxy::all(raw.as_str())
                .map_err(|e| invalid_env("SK_PROXY_URL", &raw, &format!("a proxy URL ({})", e)))?;
            options.proxy_url = Some(raw);
        }

        Ok(options)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_env(name: &str, value: &str, expected: &str) -> Error {
    Error::configuration_with_context(
        format!("{} must be {}", name, expected),
        ErrorContext::new()
            .with_field_path(name.to_string())
            .with_details(value.to_string())
            .with_source("http_options"),
    )
}

/// Raw HTTP reply: status code and body text, left for the backend to classify.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    org_id: Option<String>,
}

impl HttpTransport {
    /// Build a transport for `base_url`.
    ///
    /// An empty `api_key` sends no `Authorization` header; the service decides
    /// how to reject the call.
    pub fn new(
        base_url: &str,
        api_key: &str,
        org_id: Option<&str>,
        options: &HttpOptions,
    ) -> Result<Self> {
        let parsed = url::Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base_url.to_string()),
            )
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::configuration_with_context(
                format!("Unsupported URL scheme: {}", parsed.scheme()),
                ErrorContext::new().with_field_path("base_url"),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &options.proxy_url {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(super::TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
            org_id: org_id.map(str::to_string).filter(|o| !o.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `path` and return the raw reply.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<HttpReply> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(super::TransportError::Http(e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(super::TransportError::Http(e)))?;

        Ok(HttpReply { status, body })
    }
}
