//! Values produced by block extraction.

use serde::Serialize;
use url::Url;

/// One retailer offer as published on a listing page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedOffer {
    pub retailer_name: String,
    /// Cashback text as displayed, e.g. `Up to 5% Cash Back`.
    pub cashback_text: String,
    /// The retailer href exactly as published by the site. Stored as the
    /// site's alias for the retailer.
    pub href: String,
}

impl ScrapedOffer {
    /// Resolves the href against the page it was found on.
    pub fn absolute_url(&self, page_url: &str) -> Option<String> {
        let base = Url::parse(page_url).ok()?;
        base.join(&self.href).ok().map(String::from)
    }
}
