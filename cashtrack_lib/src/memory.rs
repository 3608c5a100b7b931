//! In-memory store, used for dry runs and tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::records::{CashbackObservation, Retailer};
use crate::store::{CashbackStore, RetailerStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    retailers: BTreeMap<String, Retailer>,
    observations: Vec<CashbackObservation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retailers ordered by id.
    pub fn retailers(&self) -> impl Iterator<Item = &Retailer> {
        self.retailers.values()
    }

    /// Observations in insertion order.
    pub fn observations(&self) -> &[CashbackObservation] {
        &self.observations
    }
}

impl RetailerStore for MemoryStore {
    fn get_retailer(&self, retailer_id: &str) -> Result<Option<Retailer>, StoreError> {
        Ok(self.retailers.get(retailer_id).cloned())
    }

    fn put_retailer(&mut self, retailer: &Retailer) -> Result<(), StoreError> {
        match self.retailers.get_mut(&retailer.retailer_id) {
            Some(existing) => {
                existing.website_aliases.extend(
                    retailer
                        .website_aliases
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                existing.updated_at = retailer.updated_at;
            }
            None => {
                self.retailers
                    .insert(retailer.retailer_id.clone(), retailer.clone());
            }
        }
        Ok(())
    }

    fn merge_aliases(
        &mut self,
        retailer_id: &str,
        aliases: &BTreeMap<String, String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let retailer = self
            .retailers
            .get_mut(retailer_id)
            .ok_or_else(|| StoreError::NotFound(retailer_id.to_string()))?;
        retailer
            .website_aliases
            .extend(aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        retailer.updated_at = updated_at;
        Ok(())
    }
}

impl CashbackStore for MemoryStore {
    fn append_rate(&mut self, observation: &CashbackObservation) -> Result<(), StoreError> {
        self.observations.push(observation.clone());
        Ok(())
    }
}
