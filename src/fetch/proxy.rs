//! Remote rendering proxy strategy. The proxy renders JavaScript, solves the
//! portal's anti-bot challenges and returns final HTML. A proxy failure fails
//! the run: falling back to a local browser here would just burn a local IP
//! right after the proxy pool was exhausted.

use super::{FetchOutcome, FetchStrategy};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

const PROXY_ENDPOINT: &str = "https://api.zenrows.com/v1/";

/// Fetches pages through a ZenRows-style rendering API.
pub struct ProxyFetcher {
    client: Client,
    api_key: String,
}

impl ProxyFetcher {
    pub fn new(api_key: String) -> Result<Self> {
        // Rendering a JS-heavy page behind residential proxies is slow;
        // allow well over the usual request timeout.
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl FetchStrategy for ProxyFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchOutcome> {
        info!("fetching via rendering proxy");

        let response = self
            .client
            .get(PROXY_ENDPOINT)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("url", url),
                ("js_render", "true"),
                ("antibot", "true"),
                ("premium_proxy", "true"),
                ("location", "es"),
            ])
            .send()
            .await
            .context("proxy request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("rendering proxy returned {status}: {body}");
        }

        let html = response
            .text()
            .await
            .context("failed to read proxy response body")?;
        debug!(bytes = html.len(), "proxy returned page HTML");

        Ok(FetchOutcome::Page(html))
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
