//! The diff engine: compares one parsed listing against persisted state and
//! applies the minimal write. Never propagates an error; every failure is
//! folded into an `Outcome::Error` so one bad record cannot abort a run.

use crate::models::{Outcome, ParsedListing, StoredListing};
use crate::store::{ListingStore, StoreError};
use tracing::{debug, info};

/// Classifies a listing as new / price-changed / unchanged against the store
/// and persists accordingly.
///
/// - unseen portal id → insert listing + one price-history entry
/// - known id, price differs → full update + one price-history entry
/// - known id, same price → bump `updated_at` only
///
/// Re-running with an unchanged record is idempotent: it yields `Unchanged`
/// and writes no additional history.
pub async fn reconcile(listing: &ParsedListing, store: &dyn ListingStore) -> Outcome {
    let existing = match store.find_by_portal_id(&listing.portal_id).await {
        Ok(found) => found,
        Err(err) => {
            return Outcome::Error {
                portal_id: listing.portal_id.clone(),
                message: format!("lookup failed: {err}"),
            }
        }
    };

    let applied = match existing {
        None => insert_new(listing, store).await,
        Some(stored) if stored.price != listing.price => {
            apply_price_change(listing, &stored, store).await
        }
        Some(stored) => touch_unchanged(listing, &stored, store).await,
    };

    match applied {
        Ok(outcome) => outcome,
        Err(err) => Outcome::Error {
            portal_id: listing.portal_id.clone(),
            message: err.to_string(),
        },
    }
}

async fn insert_new(
    listing: &ParsedListing,
    store: &dyn ListingStore,
) -> Result<Outcome, StoreError> {
    let stored = store.insert_listing(listing).await?;
    store.insert_price_entry(&stored.id, listing.price).await?;

    info!(portal_id = %listing.portal_id, price = listing.price, "new listing");
    Ok(Outcome::New {
        portal_id: listing.portal_id.clone(),
    })
}

async fn apply_price_change(
    listing: &ParsedListing,
    stored: &StoredListing,
    store: &dyn ListingStore,
) -> Result<Outcome, StoreError> {
    store.update_listing(&stored.id, listing).await?;
    store.insert_price_entry(&stored.id, listing.price).await?;

    info!(
        portal_id = %listing.portal_id,
        previous = stored.price,
        new = listing.price,
        "price changed"
    );
    Ok(Outcome::PriceChanged {
        portal_id: listing.portal_id.clone(),
        previous_price: stored.price,
        new_price: listing.price,
    })
}

async fn touch_unchanged(
    listing: &ParsedListing,
    stored: &StoredListing,
    store: &dyn ListingStore,
) -> Result<Outcome, StoreError> {
    store.touch_listing(&stored.id).await?;

    debug!(portal_id = %listing.portal_id, "listing unchanged");
    Ok(Outcome::Unchanged {
        portal_id: listing.portal_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunLogUpdate, SearchConfig};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn listing(portal_id: &str, price: i64) -> ParsedListing {
        ParsedListing {
            portal_id: portal_id.to_string(),
            title: format!("Piso {portal_id}"),
            price,
            rooms: Some(3),
            area_sqm: Some(95),
            bathrooms: Some(2),
            description: Some("Piso céntrico con garaje".to_string()),
            url: format!("https://www.idealista.com/inmueble/{portal_id}/"),
            photo_url: None,
            garage: true,
            storage_room: false,
        }
    }

    #[tokio::test]
    async fn unseen_listing_is_inserted_with_initial_history() {
        let store = MemoryStore::new();
        let record = listing("idealista-1", 150_000);

        let outcome = reconcile(&record, &store).await;

        assert_eq!(
            outcome,
            Outcome::New {
                portal_id: "idealista-1".to_string()
            }
        );
        assert_eq!(store.listing_count(), 1);
        assert_eq!(store.history_prices("idealista-1"), vec![150_000]);
    }

    #[tokio::test]
    async fn repeated_reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let record = listing("idealista-1", 150_000);

        let first = reconcile(&record, &store).await;
        let second = reconcile(&record, &store).await;

        assert!(matches!(first, Outcome::New { .. }));
        assert_eq!(
            second,
            Outcome::Unchanged {
                portal_id: "idealista-1".to_string()
            }
        );
        // Still exactly one history entry from the initial insert.
        assert_eq!(store.history_prices("idealista-1"), vec![150_000]);
        assert_eq!(store.listing_count(), 1);
    }

    #[tokio::test]
    async fn unchanged_reconcile_still_bumps_updated_at() {
        let store = MemoryStore::new();
        let record = listing("idealista-1", 150_000);

        reconcile(&record, &store).await;
        let before = store.get("idealista-1").unwrap().updated_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        reconcile(&record, &store).await;
        let after = store.get("idealista-1").unwrap().updated_at;

        assert!(after > before);
    }

    #[tokio::test]
    async fn price_drop_updates_listing_and_appends_history() {
        let store = MemoryStore::new();
        reconcile(&listing("idealista-1", 150_000), &store).await;

        let outcome = reconcile(&listing("idealista-1", 140_000), &store).await;

        assert_eq!(
            outcome,
            Outcome::PriceChanged {
                portal_id: "idealista-1".to_string(),
                previous_price: 150_000,
                new_price: 140_000,
            }
        );
        assert_eq!(store.history_prices("idealista-1"), vec![150_000, 140_000]);
        assert_eq!(store.get("idealista-1").unwrap().price, 140_000);
    }

    #[tokio::test]
    async fn other_field_changes_without_price_change_are_unchanged() {
        let store = MemoryStore::new();
        reconcile(&listing("idealista-1", 150_000), &store).await;

        let mut retitled = listing("idealista-1", 150_000);
        retitled.title = "Título nuevo".to_string();
        let outcome = reconcile(&retitled, &store).await;

        assert!(matches!(outcome, Outcome::Unchanged { .. }));
        // Only updated_at moves; the stored title keeps its original value.
        assert_eq!(store.get("idealista-1").unwrap().title, "Piso idealista-1");
        assert_eq!(store.history_count(), 1);
    }

    struct FailingStore;

    #[async_trait]
    impl ListingStore for FailingStore {
        async fn search_config(&self) -> Result<Option<SearchConfig>, StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn find_by_portal_id(
            &self,
            _portal_id: &str,
        ) -> Result<Option<crate::models::StoredListing>, StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn insert_listing(
            &self,
            _listing: &ParsedListing,
        ) -> Result<crate::models::StoredListing, StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn update_listing(
            &self,
            _id: &str,
            _listing: &ParsedListing,
        ) -> Result<(), StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn touch_listing(&self, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn insert_price_entry(&self, _listing_id: &str, _price: i64) -> Result<(), StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn start_run_log(&self) -> Result<String, StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
        async fn finish_run_log(&self, _id: &str, _update: &RunLogUpdate) -> Result<(), StoreError> {
            Err(StoreError::Request("database connection error".into()))
        }
    }

    #[tokio::test]
    async fn lookup_failure_becomes_error_outcome() {
        let outcome = reconcile(&listing("idealista-1", 150_000), &FailingStore).await;

        match outcome {
            Outcome::Error { portal_id, message } => {
                assert_eq!(portal_id, "idealista-1");
                assert!(message.contains("database connection error"));
            }
            other => panic!("expected error outcome, got {other:?}"),
        }
    }
}
