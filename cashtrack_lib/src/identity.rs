//! Retailer identity: stable ids and the alias-merging upsert.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::records::Retailer;
use crate::store::RetailerStore;

/// Stable retailer id: lowercase hex MD5 of the trimmed display name.
///
/// The same name yields the same id on every site, so one retailer listed
/// on two sites collects both aliases on a single record.
pub fn retailer_id(retailer_name: &str) -> String {
    format!("{:x}", md5::compute(retailer_name.trim().as_bytes()))
}

/// What [`upsert_retailer`] did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    AliasAdded,
    AliasChanged,
    Refreshed,
}

/// Creates the retailer with this site's alias, or merges the alias into
/// the existing record and refreshes its `updated_at`.
pub fn upsert_retailer<S>(
    store: &mut S,
    retailer_name: &str,
    website: &str,
    slug: &str,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome, StoreError>
where
    S: RetailerStore + ?Sized,
{
    let id = retailer_id(retailer_name);

    let Some(existing) = store.get_retailer(&id)? else {
        store.put_retailer(&Retailer::new(&id, retailer_name.trim(), website, slug, now))?;
        return Ok(UpsertOutcome::Created);
    };

    let outcome = match existing.website_aliases.get(website) {
        None => UpsertOutcome::AliasAdded,
        Some(current) if current != slug => UpsertOutcome::AliasChanged,
        Some(_) => UpsertOutcome::Refreshed,
    };

    let mut alias = BTreeMap::new();
    alias.insert(website.to_string(), slug.to_string());
    store.merge_aliases(&id, &alias, now)?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::Duration;

    #[test]
    fn id_is_deterministic() {
        assert_eq!(retailer_id("Acme"), retailer_id("Acme"));
        assert_eq!(retailer_id("Acme"), retailer_id("  Acme "));
        assert_ne!(retailer_id("Acme"), retailer_id("Acme Outfitters"));
    }

    #[test]
    fn id_is_md5_hex() {
        // md5("Acme")
        assert_eq!(retailer_id("Acme"), "79d894520f4f94c267986a819e110bec");
        assert_eq!(retailer_id("Acme").len(), 32);
    }

    #[test]
    fn first_sighting_creates_record() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let outcome = upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme", now).unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let r = store.get_retailer(&retailer_id("Acme")).unwrap().unwrap();
        assert_eq!(r.retailer_name, "Acme");
        assert_eq!(r.website_aliases["rakuten.ca"], "/acme");
        assert_eq!(r.created_at, now);
    }

    #[test]
    fn second_site_keeps_first_alias() {
        let mut store = MemoryStore::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme", t0).unwrap();
        let outcome = upsert_retailer(
            &mut store,
            "Acme",
            "greatcanadianrebates.ca",
            "/in/acme/",
            t1,
        )
        .unwrap();
        assert_eq!(outcome, UpsertOutcome::AliasAdded);

        let r = store.get_retailer(&retailer_id("Acme")).unwrap().unwrap();
        assert_eq!(r.website_aliases.len(), 2);
        assert_eq!(r.website_aliases["rakuten.ca"], "/acme");
        assert_eq!(r.website_aliases["greatcanadianrebates.ca"], "/in/acme/");
        assert_eq!(r.created_at, t0);
        assert_eq!(r.updated_at, t1);
    }

    #[test]
    fn changed_slug_replaces_value_not_key() {
        let mut store = MemoryStore::new();
        let t0 = Utc::now();
        upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme", t0).unwrap();
        let outcome =
            upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme-ca", t0).unwrap();
        assert_eq!(outcome, UpsertOutcome::AliasChanged);
        let r = store.get_retailer(&retailer_id("Acme")).unwrap().unwrap();
        assert_eq!(r.website_aliases["rakuten.ca"], "/acme-ca");
    }

    #[test]
    fn repeat_sighting_refreshes_timestamp() {
        let mut store = MemoryStore::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::hours(24);
        upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme", t0).unwrap();
        let outcome = upsert_retailer(&mut store, "Acme", "rakuten.ca", "/acme", t1).unwrap();
        assert_eq!(outcome, UpsertOutcome::Refreshed);
        let r = store.get_retailer(&retailer_id("Acme")).unwrap().unwrap();
        assert_eq!(r.updated_at, t1);
        assert_eq!(r.website_aliases.len(), 1);
    }
}
