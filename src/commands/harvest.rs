//! Harvest command: paginate, extract, persist, repeat.

use crate::config::Config;
use crate::dataset::{Checkpoint, ResumeState, Table};
use crate::gadgets::parser::{parse_listing_row, parse_spec_table};
use crate::gadgets::{
    Batch, BrowserError, ChromeBrowser, ItemRecord, ListingBrowser, ListingRow, SpecTable,
};
use anyhow::{Context, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SEPARATOR_WIDTH: usize = 50;

/// Distance scrolled after an intercepted click.
const INTERCEPT_SCROLL_PX: i64 = 200;

/// Totals reported once the harvest loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-empty batches processed
    pub batches: usize,
    /// Listing rows harvested by this run
    pub rows_harvested: usize,
    /// Rows kept without a spec table
    pub details_failed: usize,
    /// Rows in the dataset at exit, including earlier runs
    pub total_rows: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Harvested {} rows in {} batches ({} without specs); dataset has {} rows",
            self.rows_harvested, self.batches, self.details_failed, self.total_rows
        )
    }
}

/// Runs the scraping driver against a browser session.
pub struct HarvestCommand {
    config: Config,
}

impl HarvestCommand {
    /// Creates a new harvest command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Launches Chrome and harvests until the listing stops growing.
    pub async fn execute(&self, max_clicks: usize) -> Result<RunSummary> {
        let browser =
            ChromeBrowser::launch(&self.config).await.context("Failed to start browser session")?;

        self.execute_with_browser(&browser, max_clicks).await
    }

    /// Harvests with a provided browser (for testing). The session is shut
    /// down before returning.
    pub async fn execute_with_browser(
        &self,
        browser: &impl ListingBrowser,
        max_clicks: usize,
    ) -> Result<RunSummary> {
        let summary = Harvest::new(browser, &self.config, max_clicks).run().await;

        match browser.quit().await {
            Ok(()) => warn!("Scraping process finished. Browser closed."),
            Err(e) => error!("Failed to close browser: {}", e),
        }

        Ok(summary)
    }
}

/// Per-run driver state.
struct Harvest<'a, B: ListingBrowser + ?Sized> {
    browser: &'a B,
    config: &'a Config,
    max_clicks: usize,
    /// Clicks needed to reach the previous run's load state
    replay_target: usize,
    replayed: usize,
    /// Successful load-more clicks this session
    clicks: usize,
    popup_closed: bool,
    /// Listing rows already represented in the dataset
    seen_rows: usize,
    table: Table,
    last_model: Option<String>,
}

impl<'a, B: ListingBrowser + ?Sized> Harvest<'a, B> {
    fn new(browser: &'a B, config: &'a Config, max_clicks: usize) -> Self {
        Self {
            browser,
            config,
            max_clicks,
            replay_target: 0,
            replayed: 0,
            clicks: 0,
            popup_closed: false,
            seen_rows: 0,
            table: Table::new(),
            last_model: None,
        }
    }

    async fn run(mut self) -> RunSummary {
        self.dataset_info();

        let mut summary = RunSummary::default();
        loop {
            if self.config.max_batches.is_some_and(|max| summary.batches >= max) {
                info!("Reached the configured batch limit ({})", summary.batches);
                break;
            }

            self.load_data().await;
            let batch = self.extract_batch().await;

            if batch.is_empty() {
                warn!("No more data available. Exiting...");
                break;
            }

            summary.batches += 1;
            summary.rows_harvested += batch.summary_count();
            summary.details_failed += batch.summary_count() - batch.detail_count();

            if let Err(e) = self.persist(&batch) {
                error!("An error occurred while building the dataset: {:#}", e);
            }
        }

        summary.total_rows = self.table.len();
        summary
    }

    fn dataset_info(&mut self) {
        let state = ResumeState::inspect(self.config);
        self.seen_rows = state.rows;
        self.replay_target = state.replay_clicks;
        self.table = state.table;
    }

    /// Replays clicks owed from a previous run, then performs the new-data clicks.
    async fn load_data(&mut self) {
        if self.replayed < self.replay_target {
            info!("Retrieving old data ({} clicks)", self.replay_target - self.replayed);
        }
        while self.replayed < self.replay_target {
            self.click_load_more().await;
            sleep_ms(self.config.replay_pause_ms).await;
            self.replayed += 1;
        }

        if self.max_clicks > 0 {
            info!("New data is being fetched");
        }
        for _ in 0..self.max_clicks {
            self.click_load_more().await;
        }
    }

    /// One load-more activation. Failures are logged and swallowed.
    async fn click_load_more(&mut self) -> bool {
        match self.try_click().await {
            Ok(rows) => {
                debug!("Load more #{} -> {} rows", self.clicks, rows);
                true
            }
            Err(BrowserError::ClickIntercepted(_)) => {
                warn!("Click intercepted, scrolling and retrying...");
                if let Err(e) = self.browser.scroll_by(INTERCEPT_SCROLL_PX).await {
                    debug!("Scroll after intercepted click failed: {}", e);
                }
                false
            }
            Err(BrowserError::Timeout(what)) => {
                warn!("Timeout occurred while clicking 'Load More' button: {}", what);
                false
            }
            Err(BrowserError::NotFound(_)) => {
                warn!("No more 'Load More' button or elements found.");
                false
            }
            Err(e) => {
                warn!("Load more failed: {}", e);
                false
            }
        }
    }

    async fn try_click(&mut self) -> Result<usize, BrowserError> {
        let timeout = self.config.element_timeout();

        self.browser.reveal_load_more(timeout).await?;
        self.pause().await;

        if !self.popup_closed {
            self.close_popup().await;
            self.popup_closed = true;
        }

        self.pause().await;
        self.browser.click_load_more().await?;
        self.clicks += 1;

        let threshold = self.config.items_per_click * self.clicks;
        let rows = self.browser.wait_for_rows(threshold, timeout).await?;
        self.pause().await;

        Ok(rows)
    }

    async fn close_popup(&self) {
        match self.browser.dismiss_popup(self.config.popup_timeout()).await {
            Ok(true) => info!("Popup closed."),
            Ok(false) => info!("No popup to close."),
            Err(e) => error!("Error while closing popup: {}", e),
        }
    }

    /// Reads rows that appeared since the last batch and scrapes their details.
    async fn extract_batch(&mut self) -> Batch {
        let mut batch = Batch::new();

        let rows = match self.browser.listing_rows(self.config.element_timeout()).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to read listing rows: {}", e);
                return batch;
            }
        };

        if rows.len() < self.seen_rows {
            warn!(
                "Listing shows {} rows but the dataset already holds {}",
                rows.len(),
                self.seen_rows
            );
        }

        let new_rows = rows.len().saturating_sub(self.seen_rows);
        info!("{} Items loaded", new_rows);
        self.seen_rows += new_rows;

        if new_rows == 0 {
            return batch;
        }

        info!("Item-wise Data scraping is starting now");
        separator();

        let mut done = 0;
        for html in &rows[rows.len() - new_rows..] {
            let row = parse_listing_row(html, self.browser.base_url());
            let specs = self.fetch_specs(&row).await;

            if specs.is_some() {
                done += 1;
                info!("Loop-number {}, Data Scraping - Done", done);
            }

            batch.push(ItemRecord { summary: row.summary, detail_url: row.detail_url, specs });
        }

        batch
    }

    /// Scrapes a row's detail page, retrying not-found and timeout failures.
    async fn fetch_specs(&self, row: &ListingRow) -> Option<SpecTable> {
        let label = row.summary.model.as_deref().unwrap_or("<unnamed>");

        let Some(url) = row.detail_url.as_deref() else {
            error!("Failed: no detail link for {}", label);
            return None;
        };

        let attempts = self.config.detail_attempts.max(1);
        for attempt in 1..=attempts {
            let result = match self.browser.detail_page(url, self.config.element_timeout()).await {
                Ok(html) => parse_spec_table(&html),
                Err(e) => Err(e),
            };

            match result {
                Ok(specs) => return Some(specs),
                Err(e) if e.is_retryable() => error!(
                    "Failed: Problem raised while fetching inner specs data ({}/{}): {}",
                    attempt, attempts, e
                ),
                Err(e) => {
                    error!("Abandoning specs for {}: {}", label, e);
                    return None;
                }
            }
        }

        error!("Failed to fetch data for {} after {} attempts", label, attempts);
        None
    }

    /// Appends the batch to the running table and rewrites the output file.
    fn persist(&mut self, batch: &Batch) -> Result<()> {
        separator();
        info!("Dataset making is starting now");
        separator();

        self.table.append(Table::from_batch(batch, self.config.completeness_column));
        if let Some(last) = batch.records.last() {
            self.last_model = last.summary.model.clone();
        }

        self.table.write(&self.config.output)?;

        let checkpoint = Checkpoint {
            clicks: self.clicks,
            rows: self.table.len(),
            last_model: self.last_model.clone(),
        };
        checkpoint.save(self.config.checkpoint_path())?;

        info!("Dataset has been updated");
        separator();
        Ok(())
    }

    async fn pause(&self) {
        let jitter = if self.config.pause_jitter_ms > 0 {
            rand::rng().random_range(0..=self.config.pause_jitter_ms)
        } else {
            0
        };
        sleep_ms(self.config.pause_ms + jitter).await;
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn separator() {
    println!("{}", "-".repeat(SEPARATOR_WIDTH));
}
