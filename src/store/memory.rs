//! In-process store backend, used by tests and for dry local runs. Mirrors
//! the behavior of the real backend closely enough for reconciliation logic
//! to be exercised end to end.

use super::{ListingStore, StoreError};
use crate::models::{
    ParsedListing, PriceHistoryEntry, RunLogUpdate, RunStatus, SearchConfig, StoredListing,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct RunLogRow {
    id: String,
    status: RunStatus,
}

#[derive(Default)]
struct Inner {
    config: Option<SearchConfig>,
    listings: Vec<StoredListing>,
    history: Vec<PriceHistoryEntry>,
    run_logs: Vec<RunLogRow>,
    next_id: u64,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().config = Some(config);
        store
    }

    pub fn listing_count(&self) -> usize {
        self.inner.lock().unwrap().listings.len()
    }

    pub fn history_count(&self) -> usize {
        self.inner.lock().unwrap().history.len()
    }

    /// History prices recorded for a portal id, oldest first.
    pub fn history_prices(&self, portal_id: &str) -> Vec<i64> {
        let inner = self.inner.lock().unwrap();
        let Some(listing) = inner.listings.iter().find(|l| l.portal_id == portal_id) else {
            return Vec::new();
        };
        inner
            .history
            .iter()
            .filter(|entry| entry.listing_id == listing.id)
            .map(|entry| entry.price)
            .collect()
    }

    pub fn get(&self, portal_id: &str) -> Option<StoredListing> {
        self.inner
            .lock()
            .unwrap()
            .listings
            .iter()
            .find(|l| l.portal_id == portal_id)
            .cloned()
    }

    pub fn run_log_statuses(&self) -> Vec<RunStatus> {
        self.inner
            .lock()
            .unwrap()
            .run_logs
            .iter()
            .map(|row| row.status)
            .collect()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn search_config(&self) -> Result<Option<SearchConfig>, StoreError> {
        Ok(self.inner.lock().unwrap().config.clone())
    }

    async fn find_by_portal_id(
        &self,
        portal_id: &str,
    ) -> Result<Option<StoredListing>, StoreError> {
        Ok(self.get(portal_id))
    }

    async fn insert_listing(
        &self,
        listing: &ParsedListing,
    ) -> Result<StoredListing, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .listings
            .iter()
            .any(|l| l.portal_id == listing.portal_id)
        {
            return Err(StoreError::Rejected(format!(
                "duplicate portal_id {}",
                listing.portal_id
            )));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let stored = StoredListing {
            id: format!("mem-{}", inner.next_id),
            portal_id: listing.portal_id.clone(),
            title: listing.title.clone(),
            price: listing.price,
            rooms: listing.rooms,
            area_sqm: listing.area_sqm,
            bathrooms: listing.bathrooms,
            description: listing.description.clone(),
            url: listing.url.clone(),
            photo_url: listing.photo_url.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.listings.push(stored.clone());
        Ok(stored)
    }

    async fn update_listing(
        &self,
        id: &str,
        listing: &ParsedListing,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::Rejected(format!("no listing with id {id}")))?;

        row.title = listing.title.clone();
        row.price = listing.price;
        row.rooms = listing.rooms;
        row.area_sqm = listing.area_sqm;
        row.bathrooms = listing.bathrooms;
        row.description = listing.description.clone();
        row.url = listing.url.clone();
        row.photo_url = listing.photo_url.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_listing(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::Rejected(format!("no listing with id {id}")))?;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_price_entry(&self, listing_id: &str, price: i64) -> Result<(), StoreError> {
        self.inner.lock().unwrap().history.push(PriceHistoryEntry {
            listing_id: listing_id.to_string(),
            price,
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    async fn start_run_log(&self) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = format!("run-{}", inner.next_id);
        inner.run_logs.push(RunLogRow {
            id: id.clone(),
            status: RunStatus::Running,
        });
        Ok(id)
    }

    async fn finish_run_log(&self, id: &str, update: &RunLogUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .run_logs
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::Rejected(format!("no run log with id {id}")))?;
        row.status = update.status;
        Ok(())
    }
}
