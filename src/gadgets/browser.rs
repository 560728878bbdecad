//! WebDriver-backed browser session driving the listing and detail tabs.

use crate::config::Config;
use crate::gadgets::error::BrowserError;
use crate::gadgets::selectors::page;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Interval between polls while waiting on the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Attempts to reach a freshly spawned chromedriver before giving up.
const DRIVER_CONNECT_ATTEMPTS: u32 = 20;

/// Browser operations the harvester relies on - enables mocking for tests.
#[async_trait]
pub trait ListingBrowser: Send + Sync {
    /// Navigates the listing tab to `url`.
    async fn open(&self, url: &str) -> Result<(), BrowserError>;

    /// Closes the interstitial popup. Returns false if it never appeared.
    async fn dismiss_popup(&self, timeout: Duration) -> Result<bool, BrowserError>;

    /// Waits for the load-more control to become clickable and scrolls it into view.
    async fn reveal_load_more(&self, timeout: Duration) -> Result<(), BrowserError>;

    /// Clicks the load-more control.
    async fn click_load_more(&self) -> Result<(), BrowserError>;

    /// Scrolls the listing tab vertically by `dy` pixels.
    async fn scroll_by(&self, dy: i64) -> Result<(), BrowserError>;

    /// Number of listing rows currently in the DOM.
    async fn row_count(&self) -> Result<usize, BrowserError>;

    /// Outer HTML of every listing row, in page order.
    async fn listing_rows(&self, timeout: Duration) -> Result<Vec<String>, BrowserError>;

    /// Loads `url` in a separate tab and returns its page source once the
    /// specifications block is present. The tab is closed on every path.
    async fn detail_page(&self, url: &str, timeout: Duration) -> Result<String, BrowserError>;

    /// URL used to resolve relative detail links.
    fn base_url(&self) -> &str;

    /// Ends the browser session.
    async fn quit(&self) -> Result<(), BrowserError>;

    /// Polls until more than `threshold` rows are present.
    async fn wait_for_rows(&self, threshold: usize, timeout: Duration) -> Result<usize, BrowserError> {
        let started = Instant::now();
        loop {
            let count = self.row_count().await?;
            if count > threshold {
                return Ok(count);
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!(
                    "more than {} listing rows (have {})",
                    threshold, count
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Chrome session driven over WebDriver.
pub struct ChromeBrowser {
    driver: WebDriver,
    base_url: String,
    // Held so a spawned chromedriver lives as long as the session.
    _service: Option<Child>,
}

impl ChromeBrowser {
    /// Starts a session with the fixed Chrome options and opens the listing page.
    pub async fn launch(config: &Config) -> Result<Self, BrowserError> {
        info!("Initializing the Chrome driver and opening the website.");

        let mut caps = DesiredCapabilities::chrome();
        for arg in [
            "--ignore-certificate-errors",
            "--ignore-ssl-errors",
            "start-maximized",
            "--incognito",
        ] {
            caps.add_arg(arg).map_err(|e| BrowserError::Launch(e.to_string()))?;
        }
        caps.add_experimental_option("excludeSwitches", vec!["enable-logging"])
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        if config.headless {
            caps.set_headless().map_err(|e| BrowserError::Launch(e.to_string()))?;
        }

        let (server_url, service) = match &config.driver_path {
            Some(path) => {
                debug!("Spawning chromedriver: {}", path.display());
                let child = Command::new(path)
                    .arg(format!("--port={}", config.driver_port))
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| {
                        BrowserError::Launch(format!("{}: {}", path.display(), e))
                    })?;
                (format!("http://localhost:{}", config.driver_port), Some(child))
            }
            None => (config.webdriver_url.clone(), None),
        };

        let driver = connect(&server_url, caps, service.is_some()).await?;

        let browser = Self { driver, base_url: config.url.clone(), _service: service };
        if let Err(e) = browser.open(&config.url).await {
            let _ = browser.quit().await;
            return Err(e);
        }

        tokio::time::sleep(config.initial_load()).await;
        info!("Website loaded successfully.");

        Ok(browser)
    }

    async fn wait_for_element(&self, by: By, timeout: Duration) -> Result<WebElement, BrowserError> {
        let started = Instant::now();
        loop {
            match self.driver.find(by.clone()).await {
                Ok(element) => return Ok(element),
                Err(e) => {
                    let err = BrowserError::from(e);
                    if !matches!(err, BrowserError::NotFound(_)) {
                        return Err(err);
                    }
                }
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!("{:?}", by)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_clickable(
        &self,
        by: By,
        timeout: Duration,
    ) -> Result<WebElement, BrowserError> {
        let started = Instant::now();
        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            let element = self.wait_for_element(by.clone(), remaining).await?;
            if element.is_clickable().await? {
                return Ok(element);
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!("{:?} to be clickable", by)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Body of [`ListingBrowser::detail_page`] once the tab is focused.
    async fn load_detail(&self, url: &str, timeout: Duration) -> Result<String, BrowserError> {
        self.driver.goto(url).await?;
        self.wait_for_element(By::XPath(page::SPECS_XPATH), timeout).await?;
        Ok(self.driver.source().await?)
    }
}

/// Connects to the WebDriver server, retrying while a spawned driver boots.
async fn connect(
    server_url: &str,
    caps: ChromeCapabilities,
    spawned: bool,
) -> Result<WebDriver, BrowserError> {
    let attempts = if spawned { DRIVER_CONNECT_ATTEMPTS } else { 1 };
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match WebDriver::new(server_url, caps.clone()).await {
            Ok(driver) => return Ok(driver),
            Err(e) => {
                debug!("WebDriver connect attempt {} failed: {}", attempt, e);
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    Err(BrowserError::Launch(format!("{}: {}", server_url, last_error)))
}

/// Window operations used to retire a detail tab.
#[async_trait]
trait TabHost: Send + Sync {
    async fn current_window(&self) -> Result<WindowHandle, BrowserError>;
    async fn focus_window(&self, handle: WindowHandle) -> Result<(), BrowserError>;
    async fn close_current(&self) -> Result<(), BrowserError>;
}

#[async_trait]
impl TabHost for WebDriver {
    async fn current_window(&self) -> Result<WindowHandle, BrowserError> {
        Ok(self.window().await?)
    }

    async fn focus_window(&self, handle: WindowHandle) -> Result<(), BrowserError> {
        Ok(self.switch_to_window(handle).await?)
    }

    async fn close_current(&self) -> Result<(), BrowserError> {
        Ok(self.close_window().await?)
    }
}

/// Closes `tab` and refocuses `listing`.
///
/// The close only happens once `tab` holds focus, so a tab that cannot be
/// focused is left open rather than closing the listing window instead.
async fn release_tab(
    host: &impl TabHost,
    tab: WindowHandle,
    listing: WindowHandle,
) -> Result<(), BrowserError> {
    let focused = match host.current_window().await {
        Ok(current) if current == tab => true,
        _ => host.focus_window(tab.clone()).await.is_ok(),
    };

    if focused {
        if let Err(e) = host.close_current().await {
            warn!("Failed to close detail tab: {}", e);
        }
    } else {
        warn!("Could not focus detail tab {}, leaving it open", tab);
    }

    host.focus_window(listing).await
}

#[async_trait]
impl ListingBrowser for ChromeBrowser {
    async fn open(&self, url: &str) -> Result<(), BrowserError> {
        debug!("GET {}", url);
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn dismiss_popup(&self, timeout: Duration) -> Result<bool, BrowserError> {
        match self.wait_for_clickable(By::Id(page::POPUP_CLOSE_ID), timeout).await {
            Ok(button) => {
                button.click().await?;
                Ok(true)
            }
            Err(BrowserError::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn reveal_load_more(&self, timeout: Duration) -> Result<(), BrowserError> {
        let button = self.wait_for_clickable(By::XPath(page::LOAD_MORE_XPATH), timeout).await?;
        button.scroll_into_view().await?;
        Ok(())
    }

    async fn click_load_more(&self) -> Result<(), BrowserError> {
        let button = self.driver.find(By::XPath(page::LOAD_MORE_XPATH)).await?;
        button.click().await?;
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> Result<(), BrowserError> {
        self.driver.execute(&format!("window.scrollBy(0, {});", dy), Vec::new()).await?;
        Ok(())
    }

    async fn row_count(&self) -> Result<usize, BrowserError> {
        let rows = self.driver.find_all(By::XPath(page::ROW_XPATH)).await?;
        Ok(rows.len())
    }

    async fn listing_rows(&self, timeout: Duration) -> Result<Vec<String>, BrowserError> {
        let container = self.wait_for_element(By::Id(page::LISTING_ID), timeout).await?;
        let rows = container.find_all(By::XPath(page::ROW_XPATH)).await?;

        let mut html = Vec::with_capacity(rows.len());
        for row in rows {
            html.push(row.outer_html().await?);
        }
        Ok(html)
    }

    async fn detail_page(&self, url: &str, timeout: Duration) -> Result<String, BrowserError> {
        let listing = self.driver.window().await?;
        let tab = self.driver.new_tab().await?;

        let result = match self.driver.switch_to_window(tab.clone()).await {
            Ok(()) => self.load_detail(url, timeout).await,
            Err(e) => Err(e.into()),
        };

        release_tab(&self.driver, tab, listing).await?;
        result
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}
