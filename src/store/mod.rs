//! Persistence boundary. The pipeline only ever talks to `ListingStore`;
//! concrete backends (in-memory, PostgREST) live in the submodules and do all
//! shape validation at this boundary.

pub mod memory;
pub mod rest;

use crate::models::{ParsedListing, RunLogUpdate, SearchConfig, StoredListing};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Expected store failure modes. Not-found is never an error; lookups return
/// `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),
    #[error("store returned malformed data: {0}")]
    Malformed(String),
    #[error("store rejected write: {0}")]
    Rejected(String),
}

/// Typed record store consumed by the reconciler and the orchestrator.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// The saved search profile, or `None` when nothing is configured yet.
    async fn search_config(&self) -> Result<Option<SearchConfig>, StoreError>;

    /// Looks a listing up by its portal-assigned id.
    async fn find_by_portal_id(&self, portal_id: &str)
        -> Result<Option<StoredListing>, StoreError>;

    /// Inserts a freshly parsed listing and returns the stored row. The
    /// derived garage/storage flags are not store columns and are dropped.
    async fn insert_listing(&self, listing: &ParsedListing)
        -> Result<StoredListing, StoreError>;

    /// Overwrites every mutable field of a stored listing and bumps `updated_at`.
    async fn update_listing(&self, id: &str, listing: &ParsedListing) -> Result<(), StoreError>;

    /// Bumps `updated_at` only, for listings seen again without changes.
    async fn touch_listing(&self, id: &str) -> Result<(), StoreError>;

    /// Appends one price-history entry for a listing.
    async fn insert_price_entry(&self, listing_id: &str, price: i64) -> Result<(), StoreError>;

    /// Opens a run-log row in `running` state, returning its id.
    async fn start_run_log(&self) -> Result<String, StoreError>;

    /// Closes a run-log row with the final status and counts.
    async fn finish_run_log(&self, id: &str, update: &RunLogUpdate) -> Result<(), StoreError>;
}
