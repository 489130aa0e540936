//! End-to-end pipeline tests against the in-memory store and canned fetch
//! strategies: no network, no browser, zero jitter.

use anyhow::Result;
use async_trait::async_trait;
use piso_scout::fetch::{FetchOutcome, FetchStrategy};
use piso_scout::models::{RunLogUpdate, RunStatus, SearchConfig};
use piso_scout::pipeline;
use piso_scout::search::JitterPolicy;
use piso_scout::store::MemoryStore;

const RESULTS_PAGE: &str = r#"
<html><body><section class="items-container">
  <article data-adid="idealista-12345">
    <a class="item-link" href="/inmueble/12345/">Piso en calle ejemplo 5, Burgos</a>
    <span class="item-price">185.000€</span>
    <span class="item-detail">3 hab.</span>
    <span class="item-detail">95 m²</span>
    <div class="item-description">Piso céntrico con garaje y trastero.</div>
  </article>
  <article data-adid="idealista-67890">
    <a class="item-link" href="/inmueble/67890/">Apartamento en avenida del Cid</a>
    <span class="item-price">120.000€</span>
    <span class="item-detail">2 hab.</span>
  </article>
  <article class="decoy"><div>Mal formado, sin id</div></article>
</section></body></html>
"#;

struct StaticFetcher {
    outcome: FetchOutcome,
}

impl StaticFetcher {
    fn page(html: &str) -> Self {
        Self {
            outcome: FetchOutcome::Page(html.to_string()),
        }
    }

    fn no_results() -> Self {
        Self {
            outcome: FetchOutcome::NoResults,
        }
    }
}

#[async_trait]
impl FetchStrategy for StaticFetcher {
    async fn fetch_page(&self, _url: &str) -> Result<FetchOutcome> {
        Ok(self.outcome.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

struct FailingFetcher;

#[async_trait]
impl FetchStrategy for FailingFetcher {
    async fn fetch_page(&self, _url: &str) -> Result<FetchOutcome> {
        anyhow::bail!("proxy exhausted")
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn store_with_config() -> MemoryStore {
    MemoryStore::with_config(SearchConfig::default())
}

#[tokio::test]
async fn first_run_classifies_every_card_as_new() {
    let store = store_with_config();
    let fetcher = StaticFetcher::page(RESULTS_PAGE);

    let result = pipeline::run(&store, &fetcher, &JitterPolicy::none())
        .await
        .unwrap();

    assert_eq!(result.total_processed, 2);
    assert_eq!(result.new_listings.len(), 2);
    assert_eq!(result.price_changes.len(), 0);
    assert_eq!(result.unchanged, 0);
    assert!(result.errors.is_empty());
    assert_eq!(store.listing_count(), 2);
    assert_eq!(store.history_count(), 2);
}

#[tokio::test]
async fn second_identical_run_is_all_unchanged() {
    let store = store_with_config();
    let fetcher = StaticFetcher::page(RESULTS_PAGE);
    let jitter = JitterPolicy::none();

    pipeline::run(&store, &fetcher, &jitter).await.unwrap();
    let result = pipeline::run(&store, &fetcher, &jitter).await.unwrap();

    assert_eq!(result.total_processed, 2);
    assert_eq!(result.new_listings.len(), 0);
    assert_eq!(result.unchanged, 2);
    // History untouched by the unchanged run.
    assert_eq!(store.history_count(), 2);
}

#[tokio::test]
async fn price_change_between_runs_is_detected() {
    let store = store_with_config();
    let jitter = JitterPolicy::none();

    pipeline::run(&store, &StaticFetcher::page(RESULTS_PAGE), &jitter)
        .await
        .unwrap();

    let discounted = RESULTS_PAGE.replace("185.000€", "179.000€");
    let result = pipeline::run(&store, &StaticFetcher::page(&discounted), &jitter)
        .await
        .unwrap();

    assert_eq!(result.price_changes.len(), 1);
    assert_eq!(result.unchanged, 1);
    assert_eq!(
        store.history_prices("idealista-12345"),
        vec![185_000, 179_000]
    );
}

#[tokio::test]
async fn no_results_yields_an_empty_run() {
    let store = store_with_config();
    let fetcher = StaticFetcher::no_results();

    let result = pipeline::run(&store, &fetcher, &JitterPolicy::none())
        .await
        .unwrap();

    assert_eq!(result.total_processed, 0);
    assert!(result.new_listings.is_empty());
    assert!(result.price_changes.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(store.listing_count(), 0);
}

#[tokio::test]
async fn page_without_cards_yields_an_empty_run() {
    let store = store_with_config();
    let fetcher = StaticFetcher::page("<html><body>Sin resultados</body></html>");

    let result = pipeline::run(&store, &fetcher, &JitterPolicy::none())
        .await
        .unwrap();

    assert_eq!(result.total_processed, 0);
}

#[tokio::test]
async fn missing_search_config_is_fatal() {
    let store = MemoryStore::new();
    let fetcher = StaticFetcher::page(RESULTS_PAGE);

    let err = pipeline::run(&store, &fetcher, &JitterPolicy::none())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no search config"));
}

#[tokio::test]
async fn fetch_failure_is_fatal() {
    let store = store_with_config();

    let err = pipeline::run(&store, &FailingFetcher, &JitterPolicy::none())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("proxy exhausted"));
}

#[tokio::test]
async fn run_log_tracks_success_and_error() {
    let store = store_with_config();

    let id = pipeline::log_run_start(&store).await;
    assert!(id.is_some());

    let result = pipeline::run(&store, &StaticFetcher::no_results(), &JitterPolicy::none())
        .await
        .unwrap();
    pipeline::log_run_finish(&store, id, RunLogUpdate::success(&result)).await;

    assert_eq!(store.run_log_statuses(), vec![RunStatus::Success]);

    let id = pipeline::log_run_start(&store).await;
    pipeline::log_run_finish(&store, id, RunLogUpdate::error("proxy exhausted")).await;
    assert_eq!(
        store.run_log_statuses(),
        vec![RunStatus::Success, RunStatus::Error]
    );
}
