//! Integration tests for the listing and detail parsers using fixture files.

use phone_finder_crawler::gadgets::parser::{parse_listing_row, parse_spec_table};
use scraper::{Html, Selector};

const LISTING_FIXTURE: &str = include_str!("fixtures/listing.html");
const DETAIL_FIXTURE: &str = include_str!("fixtures/detail.html");
const BASE: &str = "https://www.gadgets360.com/mobiles/phone-finder";

fn listing_rows() -> Vec<String> {
    let document = Html::parse_document(LISTING_FIXTURE);
    let row = Selector::parse("#allplist div._flx._lpbwg").unwrap();
    document.select(&row).map(|e| e.html()).collect()
}

#[test]
fn test_parse_listing_fixture() {
    let rows = listing_rows();
    assert_eq!(rows.len(), 2);

    let iphone = parse_listing_row(&rows[0], BASE);
    assert_eq!(iphone.summary.model.as_deref(), Some("Apple iPhone 15"));
    assert_eq!(
        iphone.summary.released_date.as_deref(),
        Some("Release Date: 12th September 2023")
    );
    assert_eq!(iphone.summary.full_price.as_deref(), Some("₹79,900"));
    assert_eq!(iphone.summary.discounted_price.as_deref(), Some("₹65,999"));
    assert!(iphone.summary.is_complete());

    // Second row has no prices and a relative link
    let oneplus = parse_listing_row(&rows[1], BASE);
    assert_eq!(oneplus.summary.model.as_deref(), Some("OnePlus 12R"));
    assert!(oneplus.summary.full_price.is_none());
    assert!(oneplus.summary.discounted_price.is_none());
    assert!(!oneplus.summary.is_complete());
    assert_eq!(
        oneplus.detail_url.as_deref(),
        Some("https://www.gadgets360.com/oneplus-12r-price-in-india-127432")
    );
}

#[test]
fn test_parse_detail_fixture() {
    let specs = parse_spec_table(DETAIL_FIXTURE).unwrap();

    assert_eq!(specs.len(), 5);
    assert_eq!(specs.get("Brand"), Some("Apple"));
    assert_eq!(specs.get("Screen size (inches)"), Some("6.10"));
    assert_eq!(specs.get("Colours"), Some("Black, Blue, Green, Yellow, Pink"));
    assert_eq!(specs.labels().next(), Some("Brand"));
}

#[test]
fn test_listing_page_is_not_a_detail_page() {
    assert!(parse_spec_table(LISTING_FIXTURE).is_err());
}
