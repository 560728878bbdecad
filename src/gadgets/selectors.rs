//! Locators for the phone-finder listing and detail pages.
//!
//! Everything tied to the site's markup lives here. When extraction starts
//! returning empty fields or timing out, capture the page HTML, update the
//! locators and add a fixture to the tests below.

use scraper::Selector;
use std::sync::LazyLock;

/// WebDriver locators used while driving the listing tab.
pub mod page {
    /// "Load more" control under the listing.
    pub const LOAD_MORE_XPATH: &str = r#".//span[@class="load-more _btn"]"#;

    /// Close button of the interstitial shown on first scroll.
    pub const POPUP_CLOSE_ID: &str = "btnClosenotify";

    /// Container holding every listing row.
    pub const LISTING_ID: &str = "allplist";

    /// One listing row, relative to the container.
    pub const ROW_XPATH: &str = r#".//div[contains(@class, "_flx _lpbwg")]"#;

    /// Specifications block on a detail page.
    pub const SPECS_XPATH: &str = r#".//div[@class="_pdswrp"]"#;
}

/// Selectors applied to a single listing row's HTML.
pub mod row {
    use super::*;

    /// Model name / identifier.
    pub static MODEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("._hd").unwrap());

    /// Release date line.
    pub static RELEASED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("._dtli").unwrap());

    /// Price before discount.
    pub static FULL_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("._lpcprc").unwrap());

    /// Price after discount.
    pub static DISCOUNTED_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a._lprc > span").unwrap());

    /// Image link pointing at the detail page.
    pub static DETAIL_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a._lpimga[href]").unwrap());
}

/// Selectors applied to a detail page's source.
pub mod detail {
    use super::*;

    /// Specifications container.
    pub static SPECS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div._pdswrp").unwrap());

    /// Spec label cells.
    pub static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("._ttl").unwrap());

    /// Spec value cells.
    pub static VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("._vltxt").unwrap());
}
