use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One listing as extracted from a results page. Produced fresh on every run;
/// never stored as-is. `rooms`/`area_sqm`/`bathrooms` are `None` when the card
/// does not show them, while a missing or unreadable price becomes 0 so the
/// two cases stay distinguishable downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedListing {
    /// The portal's own stable id for the ad (`data-adid`). Natural key for upserts.
    pub portal_id: String,
    pub title: String,
    /// Price in whole euros, 0 when the card shows no parseable price.
    pub price: i64,
    pub rooms: Option<i64>,
    pub area_sqm: Option<i64>,
    pub bathrooms: Option<i64>,
    pub description: Option<String>,
    /// Absolute URL of the ad.
    pub url: String,
    pub photo_url: Option<String>,
    /// Derived from keywords in title + description, not a store column.
    pub garage: bool,
    /// Derived from keywords in title + description, not a store column.
    pub storage_room: bool,
}

/// A listing as the store holds it: everything the parser extracts plus the
/// store-assigned id and bookkeeping columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredListing {
    pub id: String,
    pub portal_id: String,
    pub title: String,
    pub price: i64,
    pub rooms: Option<i64>,
    pub area_sqm: Option<i64>,
    pub bathrooms: Option<i64>,
    pub description: Option<String>,
    pub url: String,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only price history row. Written exactly once per price event
/// (initial insert or change), never on an unchanged reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistoryEntry {
    pub listing_id: String,
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Saved search profile. Thresholds of 0 mean "no filter". The garage and
/// storage flags are informational only: the portal query does not filter on
/// them, detection happens client-side via keywords.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub min_rooms: i64,
    pub min_bathrooms: i64,
    pub min_area_sqm: i64,
    pub garage: bool,
    pub storage_room: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_rooms: 0,
            min_bathrooms: 0,
            min_area_sqm: 0,
            garage: false,
            storage_room: false,
        }
    }
}

/// Classification of one reconciled listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    New {
        portal_id: String,
    },
    PriceChanged {
        portal_id: String,
        previous_price: i64,
        new_price: i64,
    },
    Unchanged {
        portal_id: String,
    },
    Error {
        portal_id: String,
        message: String,
    },
}

impl Outcome {
    pub fn portal_id(&self) -> &str {
        match self {
            Outcome::New { portal_id }
            | Outcome::PriceChanged { portal_id, .. }
            | Outcome::Unchanged { portal_id }
            | Outcome::Error { portal_id, .. } => portal_id,
        }
    }
}

/// Aggregate result of one full fetch → parse → reconcile run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub total_processed: usize,
    pub new_listings: Vec<Outcome>,
    pub price_changes: Vec<Outcome>,
    pub unchanged: usize,
    pub errors: Vec<Outcome>,
    pub executed_at: DateTime<Utc>,
}

impl RunResult {
    pub fn empty() -> Self {
        Self {
            total_processed: 0,
            new_listings: Vec::new(),
            price_changes: Vec::new(),
            unchanged: 0,
            errors: Vec::new(),
            executed_at: Utc::now(),
        }
    }
}

/// Status of a persisted run-log row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

/// Fields written to the run-log row when a run finishes.
#[derive(Debug, Clone, Serialize)]
pub struct RunLogUpdate {
    pub status: RunStatus,
    pub listings_found: Option<usize>,
    pub listings_new: Option<usize>,
    pub listings_updated: Option<usize>,
    pub error_message: Option<String>,
}

impl RunLogUpdate {
    pub fn success(result: &RunResult) -> Self {
        Self {
            status: RunStatus::Success,
            listings_found: Some(result.total_processed),
            listings_new: Some(result.new_listings.len()),
            listings_updated: Some(result.price_changes.len()),
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            listings_found: None,
            listings_new: None,
            listings_updated: None,
            error_message: Some(message.into()),
        }
    }
}
