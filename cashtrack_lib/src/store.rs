//! Store interfaces the scrape pipeline writes through.
//!
//! Two collections: retailer identity records keyed by retailer id, and
//! cashback observations. [`crate::Db`] backs both with SQLite and
//! [`crate::MemoryStore`] keeps them in memory.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::records::{CashbackObservation, Retailer};

pub trait RetailerStore {
    /// Point lookup by retailer id.
    fn get_retailer(&self, retailer_id: &str) -> Result<Option<Retailer>, StoreError>;

    /// Inserts a record. If the id already exists, its name and
    /// `created_at` are kept and the record's aliases are merged in.
    fn put_retailer(&mut self, retailer: &Retailer) -> Result<(), StoreError>;

    /// Adds `aliases` to the retailer's alias map and sets `updated_at`.
    /// Keys already present and absent from `aliases` are left alone.
    fn merge_aliases(
        &mut self,
        retailer_id: &str,
        aliases: &BTreeMap<String, String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

pub trait CashbackStore {
    /// Appends an observation. Earlier observations are never touched.
    fn append_rate(&mut self, observation: &CashbackObservation) -> Result<(), StoreError>;
}
