//! Persisted records: retailers and cashback rate observations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedRate;

/// A merchant, identified across every rebate site by a hash of its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retailer {
    pub retailer_id: String,
    pub retailer_name: String,
    /// Website name -> that website's href for this retailer. Keys are
    /// only ever added.
    pub website_aliases: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Retailer {
    /// A fresh record carrying a single website alias.
    pub fn new(
        retailer_id: &str,
        retailer_name: &str,
        website: &str,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut website_aliases = BTreeMap::new();
        website_aliases.insert(website.to_string(), slug.to_string());
        Self {
            retailer_id: retailer_id.to_string(),
            retailer_name: retailer_name.to_string(),
            website_aliases,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One observed cashback rate. Observations form an append-only history
/// per retailer and website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashbackObservation {
    /// `{retailer_id}_{website_name}`.
    pub retailer_website_key: String,
    pub retailer_id: String,
    pub website_name: String,
    pub cashback_rate: String,
    pub is_up_to: bool,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CashbackObservation {
    pub fn new(
        retailer_id: &str,
        website_name: &str,
        rate: &NormalizedRate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            retailer_website_key: retailer_website_key(retailer_id, website_name),
            retailer_id: retailer_id.to_string(),
            website_name: website_name.to_string(),
            cashback_rate: rate.rate.clone(),
            is_up_to: rate.is_up_to,
            observed_at: now,
            created_at: now,
        }
    }
}

pub fn retailer_website_key(retailer_id: &str, website_name: &str) -> String {
    format!("{}_{}", retailer_id, website_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_key_combines_id_and_site() {
        let rate = NormalizedRate {
            rate: "5".into(),
            is_up_to: true,
        };
        let obs = CashbackObservation::new("abc123", "rakuten.ca", &rate, Utc::now());
        assert_eq!(obs.retailer_website_key, "abc123_rakuten.ca");
        assert_eq!(obs.cashback_rate, "5");
        assert!(obs.is_up_to);
        assert_eq!(obs.observed_at, obs.created_at);
    }

    #[test]
    fn new_retailer_has_one_alias() {
        let now = Utc::now();
        let r = Retailer::new("abc123", "Acme", "rakuten.ca", "/acme", now);
        assert_eq!(r.website_aliases.len(), 1);
        assert_eq!(r.website_aliases["rakuten.ca"], "/acme");
        assert_eq!(r.created_at, r.updated_at);
    }
}
