//! phone-finder-crawler - browser-driven phone listing harvester
//!
//! Pages through a "load more" product listing with WebDriver, scrapes each
//! item's summary fields and detail-page spec table, and keeps the results in
//! a CSV file that later runs resume from.

pub mod commands;
pub mod config;
pub mod dataset;
pub mod gadgets;
pub mod prompt;

pub use config::Config;
pub use dataset::Table;
pub use gadgets::{Batch, ItemRecord, ItemSummary, SpecTable};
