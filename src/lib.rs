//! piso-scout: monitors an Idealista search for new apartments and price
//! changes, reconciling each scraped listing against a persisted store and
//! producing notification payloads for the changes it finds.

pub mod fetch;
pub mod models;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod search;
pub mod store;
