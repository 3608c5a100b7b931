//! Pull retailer offers out of a listing page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::{CompiledSelectors, ExtractError, ScrapedOffer};

static UP_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bup\s+to(\b|[0-9])").expect("valid up to pattern"));

/// Result of reading one page: the offers that parsed and the blocks that
/// did not. A bad block never hides the good ones next to it.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub offers: Vec<ScrapedOffer>,
    pub failures: Vec<BlockFailure>,
}

/// A retailer block that was found but could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    /// Zero-based position of the block on the page.
    pub index: usize,
    /// Retailer name, when it was readable.
    pub retailer_name: Option<String>,
    pub error: ExtractError,
}

/// Finds every retailer block in `html` and extracts its offer.
pub fn extract_offers(html: &str, selectors: &CompiledSelectors) -> PageExtraction {
    let document = Html::parse_document(html);
    let mut out = PageExtraction::default();

    for (index, block) in document.select(&selectors.block).enumerate() {
        match extract_block(block, selectors) {
            Ok(offer) => out.offers.push(offer),
            Err((retailer_name, error)) => out.failures.push(BlockFailure {
                index,
                retailer_name,
                error,
            }),
        }
    }

    out
}

fn extract_block(
    block: ElementRef<'_>,
    selectors: &CompiledSelectors,
) -> Result<ScrapedOffer, (Option<String>, ExtractError)> {
    let name_el = block
        .select(&selectors.name)
        .next()
        .ok_or((None, ExtractError::MissingElement { field: "name" }))?;
    let retailer_name = element_text(name_el);
    if retailer_name.is_empty() {
        return Err((None, ExtractError::EmptyField { field: "name" }));
    }

    let fail = |error: ExtractError| (Some(retailer_name.clone()), error);

    let cashback_el = block
        .select(&selectors.cashback)
        .next()
        .ok_or_else(|| fail(ExtractError::MissingElement { field: "cashback" }))?;
    let mut cashback_text = element_text(cashback_el);
    if selectors.qualifier_from_parent {
        cashback_text = with_parent_qualifier(cashback_el, cashback_text);
    }

    let link_el = match &selectors.link {
        Some(sel) => block
            .select(sel)
            .next()
            .ok_or_else(|| fail(ExtractError::MissingElement { field: "link" }))?,
        None => name_el,
    };
    let href = link_el
        .value()
        .attr("href")
        .map(str::trim)
        .ok_or_else(|| fail(ExtractError::MissingElement { field: "href" }))?;
    if href.is_empty() {
        return Err(fail(ExtractError::EmptyField { field: "href" }));
    }

    Ok(ScrapedOffer {
        href: href.to_string(),
        cashback_text,
        retailer_name,
    })
}

/// Some listings print "Up to" next to the rebate span instead of inside
/// it. Carry the qualifier over so normalization sees it. Only the parent's
/// own text counts, never text inside sibling elements such as the name.
fn with_parent_qualifier(cashback_el: ElementRef<'_>, cashback_text: String) -> String {
    if UP_TO.is_match(&cashback_text) {
        return cashback_text;
    }
    let parent_text = cashback_el
        .parent()
        .and_then(ElementRef::wrap)
        .map(own_text)
        .unwrap_or_default();
    if UP_TO.is_match(&parent_text) {
        format!("Up to {}", cashback_text)
    } else {
        cashback_text
    }
}

/// Text nodes that are direct children of `el`.
fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SiteSelectors;

    fn rakuten() -> CompiledSelectors {
        SiteSelectors {
            block: "div.promo-store-block".into(),
            name: "a.store-name".into(),
            cashback: "span.now_rebate".into(),
            link: None,
            qualifier_from_parent: false,
        }
        .compile()
        .unwrap()
    }

    fn gcr() -> CompiledSelectors {
        SiteSelectors {
            block: "fieldset.smallbox.nolegend".into(),
            name: "a.listshopname".into(),
            cashback: "span.listrebate".into(),
            link: None,
            qualifier_from_parent: true,
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn extracts_well_formed_block() {
        let html = r#"
            <div class="promo-store-block">
              <a class="store-name" href=" /acme ">  Acme
                Outfitters </a>
              <span class="now_rebate">Up to 10% Cash Back</span>
            </div>"#;
        let page = extract_offers(html, &rakuten());
        assert!(page.failures.is_empty());
        assert_eq!(
            page.offers,
            vec![ScrapedOffer {
                retailer_name: "Acme Outfitters".into(),
                cashback_text: "Up to 10% Cash Back".into(),
                href: "/acme".into(),
            }]
        );
    }

    #[test]
    fn missing_cashback_skips_only_that_block() {
        let html = r#"
            <div class="promo-store-block">
              <a class="store-name" href="/acme">Acme</a>
              <span class="now_rebate">5%</span>
            </div>
            <div class="promo-store-block">
              <a class="store-name" href="/broken">Broken Co</a>
            </div>
            <div class="promo-store-block">
              <a class="store-name" href="/zed">Zed</a>
              <span class="now_rebate">1.5%</span>
            </div>"#;
        let page = extract_offers(html, &rakuten());
        assert_eq!(page.offers.len(), 2);
        assert_eq!(page.offers[1].retailer_name, "Zed");
        assert_eq!(
            page.failures,
            vec![BlockFailure {
                index: 1,
                retailer_name: Some("Broken Co".into()),
                error: ExtractError::MissingElement { field: "cashback" },
            }]
        );
    }

    #[test]
    fn missing_name_reports_no_retailer() {
        let html = r#"<div class="promo-store-block"><span class="now_rebate">5%</span></div>"#;
        let page = extract_offers(html, &rakuten());
        assert!(page.offers.is_empty());
        assert_eq!(page.failures[0].retailer_name, None);
        assert_eq!(
            page.failures[0].error,
            ExtractError::MissingElement { field: "name" }
        );
    }

    #[test]
    fn missing_href_is_a_failure() {
        let html = r#"
            <div class="promo-store-block">
              <a class="store-name">Acme</a>
              <span class="now_rebate">5%</span>
            </div>"#;
        let page = extract_offers(html, &rakuten());
        assert_eq!(
            page.failures[0].error,
            ExtractError::MissingElement { field: "href" }
        );
    }

    #[test]
    fn parent_qualifier_is_carried_over() {
        let html = r#"
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/acme/">Acme</a>
              <div>Up to <span class="listrebate">8%</span></div>
            </fieldset>
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/flat/">Flat Co</a>
              <div><span class="listrebate">3%</span> rebate</div>
            </fieldset>"#;
        let page = extract_offers(html, &gcr());
        assert_eq!(page.offers[0].cashback_text, "Up to 8%");
        assert_eq!(page.offers[1].cashback_text, "3%");
    }

    #[test]
    fn parent_qualifier_not_doubled() {
        let html = r#"
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/acme/">Acme</a>
              <div><span class="listrebate">up to 8%</span></div>
            </fieldset>"#;
        let page = extract_offers(html, &gcr());
        assert_eq!(page.offers[0].cashback_text, "up to 8%");
    }

    #[test]
    fn retailer_name_is_not_read_as_qualifier() {
        let html = r#"
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/bt/">Backup Tools</a>
              <span class="listrebate">5%</span>
            </fieldset>
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/ut/">Up To Date Books</a>
              <span class="listrebate">2%</span>
            </fieldset>"#;
        let page = extract_offers(html, &gcr());
        assert_eq!(page.offers[0].cashback_text, "5%");
        assert_eq!(page.offers[1].cashback_text, "2%");
    }

    #[test]
    fn qualifier_glued_to_word_is_ignored() {
        let html = r#"
            <fieldset class="smallbox nolegend">
              <a class="listshopname" href="/in/acme/">Acme</a>
              <div>Pickup today <span class="listrebate">4%</span></div>
            </fieldset>"#;
        let page = extract_offers(html, &gcr());
        assert_eq!(page.offers[0].cashback_text, "4%");
    }

    #[test]
    fn page_without_blocks_is_empty() {
        let page = extract_offers("<html><body>maintenance</body></html>", &rakuten());
        assert!(page.offers.is_empty());
        assert!(page.failures.is_empty());
    }
}
