//! Per-site scrape definitions: which pages to fetch and how to read them.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::Error;

/// One rebate website: its name, the listing pages to fetch, and the
/// selectors that locate retailer blocks on those pages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Website name used as the alias key and in observation keys
    /// (e.g. `rakuten.ca`).
    pub name: String,
    /// Listing pages, fetched in order.
    pub urls: Vec<String>,
    pub selectors: SiteSelectors,
}

/// CSS selectors for a retailer block and the fields inside it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteSelectors {
    /// Container for one retailer's offer.
    pub block: String,
    /// Retailer name element within the block.
    pub name: String,
    /// Cashback text element within the block.
    pub cashback: String,
    /// Element carrying the retailer href. Defaults to the name element.
    #[serde(default)]
    pub link: Option<String>,
    /// Look for the "up to" qualifier in the cashback element's parent,
    /// for sites that render it outside the rebate span.
    #[serde(default)]
    pub qualifier_from_parent: bool,
}

/// Parsed form of [`SiteSelectors`], ready to run against a document.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub(crate) block: Selector,
    pub(crate) name: Selector,
    pub(crate) cashback: Selector,
    pub(crate) link: Option<Selector>,
    pub(crate) qualifier_from_parent: bool,
}

impl SiteSelectors {
    pub fn compile(&self) -> Result<CompiledSelectors, Error> {
        Ok(CompiledSelectors {
            block: parse_selector(&self.block)?,
            name: parse_selector(&self.name)?,
            cashback: parse_selector(&self.cashback)?,
            link: self.link.as_deref().map(parse_selector).transpose()?,
            qualifier_from_parent: self.qualifier_from_parent,
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, Error> {
    Selector::parse(raw).map_err(|e| Error::Selector {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(block: &str) -> SiteSelectors {
        SiteSelectors {
            block: block.to_string(),
            name: "a.store-name".to_string(),
            cashback: "span.now_rebate".to_string(),
            link: None,
            qualifier_from_parent: false,
        }
    }

    #[test]
    fn compile_valid_selectors() {
        let compiled = selectors("div.promo-store-block").compile().unwrap();
        assert!(compiled.link.is_none());
        assert!(!compiled.qualifier_from_parent);
    }

    #[test]
    fn compile_rejects_bad_selector() {
        let err = selectors("div[[").compile().unwrap_err();
        match err {
            Error::Selector { selector, .. } => assert_eq!(selector, "div[["),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn compile_rejects_bad_link_selector() {
        let mut s = selectors("div.promo-store-block");
        s.link = Some(">>".to_string());
        assert!(matches!(s.compile(), Err(Error::Selector { .. })));
    }
}
