//! The run orchestrator: build URL → fetch → parse → reconcile each record,
//! accumulating a `RunResult`. Per-record failures are folded into the
//! result; only a missing search config or a failed fetch abort the run.

use crate::fetch::{FetchOutcome, FetchStrategy};
use crate::models::{Outcome, RunLogUpdate, RunResult};
use crate::parser::parse_list_page;
use crate::reconcile::reconcile;
use crate::search::{build_search_url, JitterPolicy, PORTAL_BASE_URL};
use crate::store::ListingStore;
use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

/// Executes one full run against the given store and fetch strategy.
///
/// Returns an error only for run-fatal conditions (no search config, fetch
/// failure). A page without listings is a valid empty result.
pub async fn run(
    store: &dyn ListingStore,
    fetcher: &dyn FetchStrategy,
    jitter: &JitterPolicy,
) -> Result<RunResult> {
    let config = store
        .search_config()
        .await
        .context("failed to load search config")?
        .ok_or_else(|| anyhow!("no search config found"))?;

    let url = build_search_url(&config);
    info!(%url, strategy = fetcher.name(), "starting run");

    let html = match fetcher.fetch_page(&url).await? {
        FetchOutcome::Page(html) => html,
        FetchOutcome::NoResults => {
            warn!("fetch found no listings; finishing with an empty result");
            return Ok(RunResult::empty());
        }
    };

    let listings = parse_list_page(&html, PORTAL_BASE_URL);
    info!(count = listings.len(), "parsed listing cards");

    let mut result = RunResult::empty();
    for (index, listing) in listings.iter().enumerate() {
        // Spread writes out a little; overlapping request bursts are the
        // easiest automation signal to spot.
        if index > 0 {
            jitter.pause().await;
        }

        let outcome = reconcile(listing, store).await;
        result.total_processed += 1;
        match outcome {
            Outcome::New { .. } => result.new_listings.push(outcome),
            Outcome::PriceChanged { .. } => result.price_changes.push(outcome),
            Outcome::Unchanged { .. } => result.unchanged += 1,
            Outcome::Error { .. } => {
                warn!(portal_id = outcome.portal_id(), "record failed to reconcile");
                result.errors.push(outcome);
            }
        }
    }

    info!(
        processed = result.total_processed,
        new = result.new_listings.len(),
        price_changes = result.price_changes.len(),
        unchanged = result.unchanged,
        errors = result.errors.len(),
        "run finished"
    );
    Ok(result)
}

/// Opens a run-log row. Best effort: a store failure here is logged and the
/// run proceeds without a log id.
pub async fn log_run_start(store: &dyn ListingStore) -> Option<String> {
    match store.start_run_log().await {
        Ok(id) => Some(id),
        Err(err) => {
            warn!(%err, "could not open run log");
            None
        }
    }
}

/// Closes the run-log row, if one was opened. Best effort as well; run-log
/// failures never change the run outcome.
pub async fn log_run_finish(store: &dyn ListingStore, id: Option<String>, update: RunLogUpdate) {
    let Some(id) = id else { return };
    if let Err(err) = store.finish_run_log(&id, &update).await {
        warn!(%err, "could not close run log");
    }
}
