//! HTTP client for a node's control plane.

use anyhow::{bail, Context};
use bytes::Bytes;
use reqwest::StatusCode;

use control::error::ErrorBody;
use control::ControlRequest;

#[derive(Clone, Debug)]
pub struct ControlClient {
    url: String,
    http: reqwest::Client,
}

impl ControlClient {
    /// `control` is the node's control-plane address, `host:port`.
    pub fn new(control: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("cannot build HTTP client")?;
        Ok(Self {
            url: format!("http://{control}/"),
            http,
        })
    }

    pub async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let resp = self.send(&ControlRequest::put(key, value)).await?;
        if resp.status() != StatusCode::OK {
            bail!(describe(resp).await);
        }
        Ok(())
    }

    /// `None` when the node has no value for `key`.
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let resp = self.send(&ControlRequest::get(key)).await?;
        match resp.status() {
            StatusCode::OK => Ok(Some(resp.bytes().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => bail!(describe(resp).await),
        }
    }

    async fn send(&self, request: &ControlRequest) -> anyhow::Result<reqwest::Response> {
        self.http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))
    }
}

async fn describe(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => format!("{status}: {} ({})", body.message, body.error),
        Err(_) => format!("unexpected response {status}"),
    }
}
