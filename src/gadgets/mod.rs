//! Phone-finder specific modules: browser session, parsing and data models.

pub mod browser;
pub mod error;
pub mod models;
pub mod parser;
pub mod selectors;

pub use browser::{ChromeBrowser, ListingBrowser};
pub use error::BrowserError;
pub use models::{Batch, ItemRecord, ItemSummary, ListingRow, SpecTable};
