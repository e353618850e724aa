//! Shared REST client for vendor APIs

use crate::config::credentials::Secret;
use crate::utils::errors::{McpError, McpResult};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests to one vendor API are authenticated.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    None,
    /// A vendor-specific header carrying the key verbatim.
    Header { name: &'static str, value: Secret },
    /// `Authorization: Bearer <token>`
    Bearer(Secret),
    /// `Authorization: token <token>`
    Token(Secret),
    Basic { username: String, password: Secret },
}

impl AuthScheme {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            AuthScheme::None => request,
            AuthScheme::Header { name, value } => request.header(*name, value.expose()),
            AuthScheme::Bearer(token) => request.bearer_auth(token.expose()),
            AuthScheme::Token(token) => {
                request.header("Authorization", format!("token {}", token.expose()))
            }
            AuthScheme::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose()))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth: AuthScheme,
    headers: Vec<(&'static str, String)>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: AuthScheme) -> McpResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(McpError::ConfigError(format!(
                "'{}' cannot be used as an API base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth,
            headers: Vec::new(),
        })
    }

    /// Send `name: value` with every request.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    pub fn url(&self, segments: &[&str]) -> McpResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| McpError::ConfigError(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> McpResult<Value> {
        let url = self.url(segments)?;
        debug!(%url, "GET");
        self.send(self.client.get(url).query(query)).await
    }

    pub async fn post(&self, segments: &[&str], body: &Value) -> McpResult<Value> {
        let url = self.url(segments)?;
        debug!(%url, "POST");
        self.send(self.client.post(url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> McpResult<Value> {
        let mut request = self.auth.apply(request);
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(McpError::Upstream {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
