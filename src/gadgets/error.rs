//! Failure taxonomy for browser steps.

use thirtyfour::error::{WebDriverError, WebDriverErrorInner};
use thiserror::Error;

/// Errors surfaced by a [`ListingBrowser`](super::browser::ListingBrowser).
///
/// The harvester decides per variant whether a step is retried, skipped or
/// aborted, so driver errors are classified here rather than passed through.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("failed to launch browser session: {0}")]
    Launch(String),

    #[error("webdriver failure: {0}")]
    Driver(String),
}

impl BrowserError {
    /// Not-found and timeout failures are worth another attempt on a detail page.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrowserError::NotFound(_) | BrowserError::Timeout(_))
    }
}

impl From<WebDriverError> for BrowserError {
    fn from(err: WebDriverError) -> Self {
        match err.as_inner() {
            WebDriverErrorInner::NoSuchElement(_) | WebDriverErrorInner::NoSuchWindow(_) => {
                BrowserError::NotFound(err.to_string())
            }
            WebDriverErrorInner::ElementClickIntercepted(_) => {
                BrowserError::ClickIntercepted(err.to_string())
            }
            // Server-side "timeout" status arrives as WebDriverTimeout.
            WebDriverErrorInner::Timeout(_)
            | WebDriverErrorInner::WebDriverTimeout(_)
            | WebDriverErrorInner::ScriptTimeout(_) => BrowserError::Timeout(err.to_string()),
            _ => BrowserError::Driver(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirtyfour::error::WebDriverErrorInfo;

    fn info(message: &str) -> WebDriverErrorInfo {
        WebDriverErrorInfo::new(message.to_string())
    }

    #[test]
    fn test_retryable_variants() {
        assert!(BrowserError::NotFound("._ttl".into()).is_retryable());
        assert!(BrowserError::Timeout("specs".into()).is_retryable());
        assert!(!BrowserError::ClickIntercepted("load more".into()).is_retryable());
        assert!(!BrowserError::Driver("session deleted".into()).is_retryable());
        assert!(!BrowserError::Launch("connection refused".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = BrowserError::Timeout("listing rows".into());
        assert_eq!(err.to_string(), "timed out waiting for listing rows");
    }

    #[test]
    fn test_missing_element_and_window_are_not_found() {
        let err = BrowserError::from(WebDriverError::NoSuchElement(info("._ttl")));
        assert!(matches!(err, BrowserError::NotFound(_)));
        assert!(err.is_retryable());

        let err = BrowserError::from(WebDriverError::NoSuchWindow(info("detail tab")));
        assert!(matches!(err, BrowserError::NotFound(_)));
    }

    #[test]
    fn test_intercepted_click_is_not_retryable() {
        let err = BrowserError::from(WebDriverError::ElementClickIntercepted(info("load more")));
        assert!(matches!(err, BrowserError::ClickIntercepted(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_and_script_timeouts_are_retryable() {
        let err = BrowserError::from(WebDriverError::WebDriverTimeout(info("page load")));
        assert!(matches!(err, BrowserError::Timeout(_)));
        assert!(err.is_retryable());

        let err = BrowserError::from(WebDriverError::ScriptTimeout(info("scrollBy")));
        assert!(matches!(err, BrowserError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_driver_errors_are_not_retryable() {
        let err = BrowserError::from(WebDriverError::UnknownError(info("session deleted")));
        assert!(matches!(err, BrowserError::Driver(_)));
        assert!(!err.is_retryable());
    }
}
