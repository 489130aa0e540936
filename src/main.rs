use anyhow::{Context, Result};
use piso_scout::fetch::{self, FetchMode};
use piso_scout::models::RunLogUpdate;
use piso_scout::notify::NotificationSummary;
use piso_scout::pipeline;
use piso_scout::search::JitterPolicy;
use piso_scout::store::RestStore;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 piso-scout — Idealista listing monitor");

    // Composition root: everything env-driven is resolved here, the pipeline
    // itself only sees injected dependencies.
    let store_url = env::var("SUPABASE_URL").context("SUPABASE_URL is not set")?;
    let store_key =
        env::var("SUPABASE_SERVICE_ROLE_KEY").context("SUPABASE_SERVICE_ROLE_KEY is not set")?;
    let store = RestStore::new(&store_url, &store_key)?;

    // Inter-record jitter only buys anything when a local browser session is
    // alive; proxy runs skip it.
    let (mode, jitter) = match env::var("ZENROWS_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("🚀 fetch mode: rendering proxy");
            (FetchMode::Proxy { api_key: key }, JitterPolicy::none())
        }
        _ => {
            info!("💻 fetch mode: local browser (no proxy API key)");
            (FetchMode::Browser, JitterPolicy::default())
        }
    };
    let fetcher = fetch::build_fetcher(mode, jitter)?;

    let log_id = pipeline::log_run_start(&store).await;

    match pipeline::run(&store, fetcher.as_ref(), &jitter).await {
        Ok(result) => {
            let summary = NotificationSummary::from_run(&result);
            if summary.has_updates() {
                println!("{}", summary.to_message());
            } else {
                info!("sin novedades en esta ejecución");
            }

            pipeline::log_run_finish(&store, log_id, RunLogUpdate::success(&result)).await;
            info!(
                processed = result.total_processed,
                new = result.new_listings.len(),
                price_changes = result.price_changes.len(),
                "✅ run completed"
            );
            Ok(())
        }
        Err(err) => {
            warn!("run failed: {err:#}");
            pipeline::log_run_finish(&store, log_id, RunLogUpdate::error(format!("{err:#}"))).await;
            Err(err)
        }
    }
}
