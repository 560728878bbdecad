//! HTML parser for listing rows and detail-page spec tables.

use crate::gadgets::error::BrowserError;
use crate::gadgets::models::{ItemSummary, ListingRow, SpecTable};
use crate::gadgets::selectors::{detail, row};
use scraper::{ElementRef, Html, Selector};
use tracing::{trace, warn};
use url::Url;

/// Parses one listing row's outer HTML.
///
/// Missing fields become `None`; the row itself never fails to parse.
/// Relative detail links are resolved against `base_url`.
pub fn parse_listing_row(html: &str, base_url: &str) -> ListingRow {
    let fragment = Html::parse_fragment(html);

    let summary = ItemSummary {
        model: select_text(&fragment, &row::MODEL),
        released_date: select_text(&fragment, &row::RELEASED),
        full_price: select_text(&fragment, &row::FULL_PRICE),
        discounted_price: select_text(&fragment, &row::DISCOUNTED_PRICE),
    };

    let detail_url = fragment
        .select(&row::DETAIL_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_url(base_url, href));

    trace!("Parsed row: {:?} -> {:?}", summary.model, detail_url);

    ListingRow { summary, detail_url }
}

/// Parses the specifications block of a detail page.
///
/// Labels and values are paired positionally. When the counts differ the
/// surplus on the longer side is dropped and a warning is logged.
pub fn parse_spec_table(html: &str) -> Result<SpecTable, BrowserError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&detail::SPECS)
        .next()
        .ok_or_else(|| BrowserError::NotFound("specifications container".to_string()))?;

    let labels: Vec<String> = container.select(&detail::LABEL).map(element_text).collect();
    let values: Vec<String> = container.select(&detail::VALUE).map(element_text).collect();

    if labels.len() != values.len() {
        warn!(
            "Spec label/value count mismatch ({} labels, {} values); pairing the first {}",
            labels.len(),
            values.len(),
            labels.len().min(values.len())
        );
    }

    Ok(labels.into_iter().zip(values).collect())
}

/// Text of the first match, whitespace-collapsed. Empty text counts as missing.
fn select_text(fragment: &Html, selector: &Selector) -> Option<String> {
    fragment.select(selector).next().map(element_text).filter(|t| !t.is_empty())
}

fn element_text(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Resolves an href against the listing page URL.
fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => match Url::parse(base_url).and_then(|base| base.join(href)) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!("Could not resolve detail link '{}': {}", href, e);
                None
            }
        },
    }
}
