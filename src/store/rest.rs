//! PostgREST-backed store (Supabase-compatible). Wire rows use the schema's
//! Spanish column names; translation to the crate's models happens here so
//! nothing upstream depends on the table layout.

use super::{ListingStore, StoreError};
use crate::models::{ParsedListing, RunLogUpdate, SearchConfig, StoredListing};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const LISTINGS_TABLE: &str = "pisos";
const HISTORY_TABLE: &str = "historico_precios";
const CONFIG_TABLE: &str = "config_busqueda";
const RUN_LOG_TABLE: &str = "scraper_logs";

/// Store backend speaking the PostgREST protocol.
pub struct RestStore {
    client: Client,
    base: String,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key).context("service key is not a valid header value")?;
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {service_key}"))
            .context("service key is not a valid header value")?;
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    async fn checked(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Request(format!("{status}: {body}")))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Request(err.to_string())
}

fn decode(err: reqwest::Error) -> StoreError {
    StoreError::Malformed(err.to_string())
}

#[derive(Debug, Deserialize)]
struct ConfigRow {
    #[serde(default)]
    min_habitaciones: Option<i64>,
    #[serde(default)]
    min_banos: Option<i64>,
    #[serde(default)]
    min_metros: Option<i64>,
    #[serde(default)]
    garaje: Option<bool>,
    #[serde(default)]
    trastero: Option<bool>,
}

impl From<ConfigRow> for SearchConfig {
    fn from(row: ConfigRow) -> Self {
        SearchConfig {
            min_rooms: row.min_habitaciones.unwrap_or(0),
            min_bathrooms: row.min_banos.unwrap_or(0),
            min_area_sqm: row.min_metros.unwrap_or(0),
            garage: row.garaje.unwrap_or(false),
            storage_room: row.trastero.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    id: String,
    portal_id: String,
    titulo: String,
    precio: i64,
    #[serde(default)]
    habitaciones: Option<i64>,
    #[serde(default)]
    metros: Option<i64>,
    #[serde(default)]
    banos: Option<i64>,
    #[serde(default)]
    descripcion: Option<String>,
    url_anuncio: String,
    #[serde(default)]
    foto_principal: Option<String>,
    #[serde(default)]
    activo: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListingRow> for StoredListing {
    fn from(row: ListingRow) -> Self {
        StoredListing {
            id: row.id,
            portal_id: row.portal_id,
            title: row.titulo,
            price: row.precio,
            rooms: row.habitaciones,
            area_sqm: row.metros,
            bathrooms: row.banos,
            description: row.descripcion,
            url: row.url_anuncio,
            photo_url: row.foto_principal,
            active: row.activo.unwrap_or(true),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Columns written on insert. Garage/storage flags are derived values with no
/// column in the table, so they never appear here.
#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    portal_id: &'a str,
    titulo: &'a str,
    precio: i64,
    habitaciones: Option<i64>,
    metros: Option<i64>,
    banos: Option<i64>,
    descripcion: Option<&'a str>,
    url_anuncio: &'a str,
    foto_principal: Option<&'a str>,
}

impl<'a> InsertRow<'a> {
    fn from_listing(listing: &'a ParsedListing) -> Self {
        Self {
            portal_id: &listing.portal_id,
            titulo: &listing.title,
            precio: listing.price,
            habitaciones: listing.rooms,
            metros: listing.area_sqm,
            banos: listing.bathrooms,
            descripcion: listing.description.as_deref(),
            url_anuncio: &listing.url,
            foto_principal: listing.photo_url.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateRow<'a> {
    #[serde(flatten)]
    fields: InsertRow<'a>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

#[async_trait]
impl ListingStore for RestStore {
    async fn search_config(&self) -> Result<Option<SearchConfig>, StoreError> {
        let response = self
            .client
            .get(self.table_url(CONFIG_TABLE))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<ConfigRow> = Self::checked(response).await?.json().await.map_err(decode)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn find_by_portal_id(
        &self,
        portal_id: &str,
    ) -> Result<Option<StoredListing>, StoreError> {
        let filter = format!("eq.{portal_id}");
        let response = self
            .client
            .get(self.table_url(LISTINGS_TABLE))
            .query(&[("select", "*"), ("portal_id", filter.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<ListingRow> = Self::checked(response).await?.json().await.map_err(decode)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn insert_listing(
        &self,
        listing: &ParsedListing,
    ) -> Result<StoredListing, StoreError> {
        let response = self
            .client
            .post(self.table_url(LISTINGS_TABLE))
            .header("Prefer", "return=representation")
            .json(&InsertRow::from_listing(listing))
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<ListingRow> = Self::checked(response).await?.json().await.map_err(decode)?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| StoreError::Malformed("insert returned no row".into()))
    }

    async fn update_listing(&self, id: &str, listing: &ParsedListing) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let body = UpdateRow {
            fields: InsertRow::from_listing(listing),
            updated_at: Utc::now(),
        };
        let response = self
            .client
            .patch(self.table_url(LISTINGS_TABLE))
            .query(&[("id", filter.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn touch_listing(&self, id: &str) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let response = self
            .client
            .patch(self.table_url(LISTINGS_TABLE))
            .query(&[("id", filter.as_str())])
            .json(&json!({ "updated_at": Utc::now() }))
            .send()
            .await
            .map_err(transport)?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn insert_price_entry(&self, listing_id: &str, price: i64) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url(HISTORY_TABLE))
            .json(&json!({ "piso_id": listing_id, "precio": price }))
            .send()
            .await
            .map_err(transport)?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn start_run_log(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.table_url(RUN_LOG_TABLE))
            .header("Prefer", "return=representation")
            .json(&json!({ "status": "running" }))
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<IdRow> = Self::checked(response).await?.json().await.map_err(decode)?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::Malformed("run log insert returned no row".into()))
    }

    async fn finish_run_log(&self, id: &str, update: &RunLogUpdate) -> Result<(), StoreError> {
        let mut body = serde_json::Map::new();
        body.insert("status".into(), json!(update.status.as_str()));
        body.insert("finished_at".into(), json!(Utc::now()));
        if let Some(found) = update.listings_found {
            body.insert("pisos_encontrados".into(), json!(found));
        }
        if let Some(new) = update.listings_new {
            body.insert("pisos_nuevos".into(), json!(new));
        }
        if let Some(updated) = update.listings_updated {
            body.insert("pisos_actualizados".into(), json!(updated));
        }
        if let Some(message) = &update.error_message {
            body.insert("error_message".into(), json!(message));
        }

        let filter = format!("eq.{id}");
        let response = self
            .client
            .patch(self.table_url(RUN_LOG_TABLE))
            .query(&[("id", filter.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::checked(response).await?;
        Ok(())
    }
}
