//! JSON-RPC over HTTP POST.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::{
    client::RpcTransport,
    wire::{RpcRequest, RpcResponse},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`RpcTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Transport POSTing to `url`.
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Endpoint this transport talks to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: RpcRequest) -> anyhow::Result<RpcResponse> {
        // Rate limiters may answer 429 with a JSON-RPC error envelope; prefer the envelope.
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("POST {}", self.url))?;
        let status = resp.status();
        let body = resp.bytes().await.context("read response body")?;
        match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(e).context("parse JSON-RPC envelope"),
            Err(_) => anyhow::bail!("HTTP {status} from {}", self.url),
        }
    }
}
