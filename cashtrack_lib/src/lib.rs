//! Library layer for cashtrack: cashback normalization, retailer identity,
//! storage, and the scrape pipeline.
//!
//! Wraps the `cashtrack_sites` crate (page fetching and block extraction)
//! with the logic that turns scraped offers into retailer records and an
//! append-only cashback history.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod memory;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod store;

pub use cashtrack_sites;
pub use cashtrack_sites::{Client, PageFetcher, ScrapedOffer, SiteConfig, SiteSelectors};

pub use config::{builtin_sites, load_sites, parse_sites, select_sites};
pub use db::{Db, DbError, LatestRateRow};
pub use error::{ConfigError, StoreError};
pub use identity::{retailer_id, upsert_retailer, UpsertOutcome};
pub use memory::MemoryStore;
pub use normalize::{normalize, NormalizedRate};
pub use pipeline::{run_scrape, InvocationResponse, RunReport};
pub use records::{CashbackObservation, Retailer};
pub use store::{CashbackStore, RetailerStore};
