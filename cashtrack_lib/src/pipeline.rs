//! The scrape run: fetch every configured page, extract offers, normalize
//! them and write retailers and observations through the injected stores.
//!
//! Nothing inside a run is fatal. A page that cannot be fetched yields no
//! offers, a block that cannot be read is skipped, and a failed write is
//! logged and abandoned. Every one of those lands in the [`RunReport`], so
//! the caller can tell a clean run from a partial one.

use std::collections::HashSet;

use cashtrack_sites::{extract_offers, PageFetcher, ScrapedOffer, SiteConfig};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::identity::{retailer_id, upsert_retailer, UpsertOutcome};
use crate::normalize::normalize;
use crate::records::CashbackObservation;
use crate::store::{CashbackStore, RetailerStore};

/// Counts and failure details for one run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub pages_fetched: usize,
    pub page_failures: Vec<PageFailure>,
    pub offers_stored: usize,
    pub retailers_created: usize,
    /// Existing retailers that gained an alias or had one changed.
    pub aliases_merged: usize,
    /// Offers for a retailer already recorded on the same site this run.
    pub duplicates: usize,
    pub skipped_items: Vec<SkippedItem>,
    pub write_failures: Vec<WriteFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub website: String,
    pub url: String,
    pub reason: String,
}

/// A retailer block that did not have the expected shape.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub website: String,
    pub url: String,
    pub index: usize,
    pub retailer_name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteFailure {
    pub website: String,
    pub retailer_name: String,
    pub record: &'static str,
    pub reason: String,
}

impl RunReport {
    /// No page, item or write failed.
    pub fn is_clean(&self) -> bool {
        self.page_failures.is_empty()
            && self.skipped_items.is_empty()
            && self.write_failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} pages fetched, {} failed; {} offers stored ({} new retailers, {} alias updates, {} duplicates); {} items skipped; {} write failures",
            self.pages_fetched,
            self.page_failures.len(),
            self.offers_stored,
            self.retailers_created,
            self.aliases_merged,
            self.duplicates,
            self.skipped_items.len(),
            self.write_failures.len()
        )
    }
}

/// Invocation-level result: a status code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// 200 for a clean run, 207 when something failed but at least one
    /// page was fetched, 502 when no page could be fetched.
    pub fn from_report(report: &RunReport) -> Self {
        let (status_code, headline) = if report.pages_fetched == 0 && !report.page_failures.is_empty() {
            (502, "Scrape failed: no pages could be fetched.")
        } else if report.is_clean() {
            (200, "Scraping and data insertion completed successfully.")
        } else {
            (207, "Scraping completed with errors.")
        };
        Self {
            status_code,
            body: format!("{} {}", headline, report.summary()),
        }
    }
}

/// Runs every site in order, one page at a time.
pub async fn run_scrape<F, S>(fetcher: &F, store: &mut S, sites: &[SiteConfig]) -> RunReport
where
    F: PageFetcher + ?Sized,
    S: RetailerStore + CashbackStore + ?Sized,
{
    let mut report = RunReport::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for site in sites {
        let selectors = match site.selectors.compile() {
            Ok(s) => s,
            Err(e) => {
                warn!("Skipping site {}: {}", site.name, e);
                for url in &site.urls {
                    report.page_failures.push(PageFailure {
                        website: site.name.clone(),
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
                continue;
            }
        };

        for url in &site.urls {
            let html = match fetcher.fetch_page(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    report.page_failures.push(PageFailure {
                        website: site.name.clone(),
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            report.pages_fetched += 1;

            let page = extract_offers(&html, &selectors);
            info!(
                "{}: {} offers, {} unreadable blocks",
                url,
                page.offers.len(),
                page.failures.len()
            );

            for failure in page.failures {
                warn!(
                    "Skipping block {} on {} ({}): {}",
                    failure.index,
                    url,
                    failure.retailer_name.as_deref().unwrap_or("unknown retailer"),
                    failure.error
                );
                report.skipped_items.push(SkippedItem {
                    website: site.name.clone(),
                    url: url.clone(),
                    index: failure.index,
                    retailer_name: failure.retailer_name,
                    reason: failure.error.to_string(),
                });
            }

            for offer in &page.offers {
                let key = (site.name.clone(), retailer_id(&offer.retailer_name));
                if seen.contains(&key) {
                    debug!("{} already recorded for {} this run", offer.retailer_name, site.name);
                    report.duplicates += 1;
                    continue;
                }
                // A sighting whose rate write failed stays retryable.
                if store_offer(store, site, url, offer, &key.1, &mut report) {
                    seen.insert(key);
                }
            }
        }
    }

    info!("Run finished: {}", report.summary());
    report
}

/// Writes the retailer and the observation. Returns whether the observation
/// was stored.
fn store_offer<S>(
    store: &mut S,
    site: &SiteConfig,
    page_url: &str,
    offer: &ScrapedOffer,
    id: &str,
    report: &mut RunReport,
) -> bool
where
    S: RetailerStore + CashbackStore + ?Sized,
{
    let now = Utc::now();
    let rate = normalize(&offer.cashback_text);

    match upsert_retailer(store, &offer.retailer_name, &site.name, &offer.href, now) {
        Ok(UpsertOutcome::Created) => {
            report.retailers_created += 1;
            debug!(
                "New retailer {} ({}) at {}",
                offer.retailer_name,
                id,
                offer.absolute_url(page_url).as_deref().unwrap_or(&offer.href)
            );
        }
        Ok(UpsertOutcome::AliasAdded) => {
            report.aliases_merged += 1;
            debug!("{} now listed on {}", offer.retailer_name, site.name);
        }
        Ok(UpsertOutcome::AliasChanged) => {
            report.aliases_merged += 1;
            info!(
                "{} moved to {} on {}",
                offer.retailer_name, offer.href, site.name
            );
        }
        Ok(UpsertOutcome::Refreshed) => {}
        Err(e) => {
            warn!("Error updating retailer {} ({}): {}", offer.retailer_name, id, e);
            report.write_failures.push(WriteFailure {
                website: site.name.clone(),
                retailer_name: offer.retailer_name.clone(),
                record: "retailer",
                reason: e.to_string(),
            });
        }
    }

    let observation = CashbackObservation::new(id, &site.name, &rate, now);
    match store.append_rate(&observation) {
        Ok(()) => {
            report.offers_stored += 1;
            debug!(
                "Inserted cashback rate for {}: {}{}",
                observation.retailer_website_key,
                if rate.is_up_to { "up to " } else { "" },
                rate.rate
            );
            true
        }
        Err(e) => {
            warn!(
                "Error inserting cashback rate for {}: {}",
                observation.retailer_website_key, e
            );
            report.write_failures.push(WriteFailure {
                website: site.name.clone(),
                retailer_name: offer.retailer_name.clone(),
                record: "cashback_rate",
                reason: e.to_string(),
            });
            false
        }
    }
}
