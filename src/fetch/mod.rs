//! Page acquisition. Two mutually exclusive strategies: a remote rendering
//! proxy for production runs, and a local headless browser for everything
//! else. Selection is an explicit `FetchMode` decided by the caller; the
//! pipeline never sniffs the environment itself.

pub mod browser;
pub mod proxy;

use crate::search::JitterPolicy;
use anyhow::Result;
use async_trait::async_trait;

pub use browser::BrowserFetcher;
pub use proxy::ProxyFetcher;

/// What a fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Raw HTML of the results page.
    Page(String),
    /// The page loaded but carries no listing marker: a valid empty result,
    /// not a failure (local strategy only).
    NoResults,
}

/// A way of turning a search URL into page HTML.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchOutcome>;

    fn name(&self) -> &'static str;
}

/// Explicit strategy selection, decided once at startup.
#[derive(Debug, Clone)]
pub enum FetchMode {
    /// Remote rendering proxy; requires an API key.
    Proxy { api_key: String },
    /// Local headless browser with anti-detection measures.
    Browser,
}

pub fn build_fetcher(mode: FetchMode, jitter: JitterPolicy) -> Result<Box<dyn FetchStrategy>> {
    match mode {
        FetchMode::Proxy { api_key } => Ok(Box::new(ProxyFetcher::new(api_key)?)),
        FetchMode::Browser => Ok(Box::new(BrowserFetcher::new(jitter))),
    }
}
