//! Local headless-browser strategy. Launches Chrome per fetch with a handful
//! of anti-detection measures: automation flags disabled, a desktop user
//! agent, a spoofed `navigator.webdriver`, and a randomized settle delay
//! after navigation. The browser and tab are dropped when the fetch returns,
//! on success and on error alike.

use super::{FetchOutcome, FetchStrategy};
use crate::search::JitterPolicy;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Structural marker that distinguishes a real results page from a block
/// page or an empty search.
const RESULTS_MARKER: &str = "article[data-adid]";

const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => false });
    window.navigator.chrome = { runtime: {} };
"#;

/// Fetches pages by driving a local headless Chrome session.
pub struct BrowserFetcher {
    jitter: JitterPolicy,
}

impl BrowserFetcher {
    pub fn new(jitter: JitterPolicy) -> Self {
        Self { jitter }
    }

    fn page_html(tab: &Arc<Tab>) -> Result<String> {
        let result = tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("failed to read page HTML")?;
        let html = result
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string();
        Ok(html)
    }

    fn fetch_blocking(&self, url: &str) -> Result<FetchOutcome> {
        info!("launching headless Chrome...");
        let options = LaunchOptions::default_builder()
            .headless(true)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .context("failed to build launch options")?;
        let browser = Browser::new(options).context("failed to launch Chrome browser")?;

        let tab = browser.new_tab()?;
        tab.set_user_agent(USER_AGENT, Some("es-ES"), None)?;

        debug!(%url, "navigating");
        tab.navigate_to(url)?;
        tab.wait_until_navigated()
            .context("navigation did not settle in time")?;

        // Best effort; a failed spoof is not worth aborting the run over.
        let _ = tab.evaluate(STEALTH_SCRIPT, false);

        // Let lazy content load and look a little less mechanical.
        self.jitter.pause_blocking();

        let html = Self::page_html(&tab)?;
        if html.is_empty() {
            anyhow::bail!("browser returned an empty page");
        }

        let document = Html::parse_document(&html);
        let marker = Selector::parse(RESULTS_MARKER).unwrap();
        if document.select(&marker).next().is_none() {
            warn!("no listing marker in page; treating as zero results (possible block)");
            return Ok(FetchOutcome::NoResults);
        }

        debug!(bytes = html.len(), "browser returned page HTML");
        Ok(FetchOutcome::Page(html))
    }
}

#[async_trait]
impl FetchStrategy for BrowserFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchOutcome> {
        self.fetch_blocking(url)
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
