//! HTTP transport over reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::query::ListQuery;
use super::wire::{CreateBody, UpdateBody, WireRecord};
use super::Transport;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::RecordId;

/// Longest raw body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Talks to the remote store over HTTPS with a static token header.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token_header: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport from the `api` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL is configured or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.require_base_url()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::transport(&e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_header: config.api.token_header.clone(),
            token: config.api.token.clone(),
        })
    }

    /// The resource URL requests go to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(self.token_header.as_str(), token.as_str()),
            None => request,
        }
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R> {
        let resp = match self.authorized(request).send().await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "Request to remote store failed");
                return Err(Error::transport(&e));
            }
        };

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::transport(&e))?;

        if !status.is_success() {
            error!(status = %status, "Remote store rejected request");
            debug!(body = %truncate(&text, MAX_BODY_EXCERPT), "Rejected response body");
            let message = extract_message(&text)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(Error::remote(Some(status.as_u16()), message));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: &CreateBody) -> Result<WireRecord> {
        debug!(url = %self.base_url, "POST record");
        self.send(self.client.post(&self.base_url).json(body)).await
    }

    async fn get(&self, query: &ListQuery) -> Result<Vec<WireRecord>> {
        debug!(
            url = %self.base_url,
            offset = query.offset(),
            limit = query.limit(),
            search = ?query.search,
            "GET records"
        );
        self.send(self.client.get(&self.base_url).query(&query.params()))
            .await
    }

    async fn patch(&self, id: RecordId, body: &UpdateBody) -> Result<WireRecord> {
        let url = format!("{}/{id}", self.base_url);
        debug!(url = %url, "PATCH record");
        self.send(self.client.patch(&url).json(body)).await
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks for `msg`, `message` or `error` string fields in a JSON object,
/// then falls back to a short plain-text body.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return ["msg", "message", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Object(inner) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            });
    }

    if trimmed.starts_with('<') {
        return None;
    }
    Some(truncate(trimmed, MAX_BODY_EXCERPT).to_string())
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
