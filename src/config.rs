//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Listing page scraped when no URL is configured.
pub const DEFAULT_URL: &str = "https://www.gadgets360.com/mobiles/phone-finder";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing page to paginate through
    #[serde(default = "default_url")]
    pub url: String,

    /// WebDriver server endpoint
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Optional chromedriver executable to spawn before connecting
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Port passed to a spawned chromedriver
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    /// Run Chrome without a visible window
    #[serde(default)]
    pub headless: bool,

    /// CSV file holding the accumulated table
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Rows revealed by one load-more click
    #[serde(default = "default_items_per_click")]
    pub items_per_click: usize,

    /// Attempts per detail page before the item is abandoned
    #[serde(default = "default_detail_attempts")]
    pub detail_attempts: u32,

    /// Fixed wait after the first navigation
    #[serde(default = "default_initial_load_secs")]
    pub initial_load_secs: u64,

    /// Timeout for element lookups and row-count waits
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,

    /// Timeout for the one-time popup
    #[serde(default = "default_popup_timeout_secs")]
    pub popup_timeout_secs: u64,

    /// Pause between click steps in milliseconds
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// Random jitter added to each pause (0 to this value)
    #[serde(default)]
    pub pause_jitter_ms: u64,

    /// Pause after each replay click in milliseconds
    #[serde(default = "default_replay_pause_ms")]
    pub replay_pause_ms: u64,

    /// How the replay click count is derived on restart
    #[serde(default)]
    pub resume: ResumeMode,

    /// Append a `complete` column flagging fully extracted rows
    #[serde(default)]
    pub completeness_column: bool,

    /// Upper bound on harvest iterations (unbounded when unset)
    #[serde(default)]
    pub max_batches: Option<usize>,

    /// New-data clicks per iteration; prompted for when unset
    #[serde(default)]
    pub max_clicks: Option<usize>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_driver_port() -> u16 {
    9515
}

fn default_output() -> PathBuf {
    PathBuf::from("dataset.csv")
}

fn default_items_per_click() -> usize {
    20
}

fn default_detail_attempts() -> u32 {
    3
}

fn default_initial_load_secs() -> u64 {
    10
}

fn default_element_timeout_secs() -> u64 {
    10
}

fn default_popup_timeout_secs() -> u64 {
    5
}

fn default_pause_ms() -> u64 {
    1000
}

fn default_replay_pause_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            webdriver_url: default_webdriver_url(),
            driver_path: None,
            driver_port: default_driver_port(),
            headless: false,
            output: default_output(),
            items_per_click: default_items_per_click(),
            detail_attempts: default_detail_attempts(),
            initial_load_secs: default_initial_load_secs(),
            element_timeout_secs: default_element_timeout_secs(),
            popup_timeout_secs: default_popup_timeout_secs(),
            pause_ms: default_pause_ms(),
            pause_jitter_ms: 0,
            replay_pause_ms: default_replay_pause_ms(),
            resume: ResumeMode::Heuristic,
            completeness_column: false,
            max_batches: None,
            max_clicks: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("phone-finder-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("PFC_URL") {
            self.url = url;
        }

        if let Ok(webdriver) = std::env::var("PFC_WEBDRIVER") {
            self.webdriver_url = webdriver;
        }

        if let Ok(output) = std::env::var("PFC_OUTPUT") {
            self.output = PathBuf::from(output);
        }

        if let Ok(driver) = std::env::var("PFC_DRIVER_PATH") {
            self.driver_path = Some(PathBuf::from(driver));
        }

        self
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_secs(self.popup_timeout_secs)
    }

    pub fn initial_load(&self) -> Duration {
        Duration::from_secs(self.initial_load_secs)
    }

    /// Sidecar file recording the last persisted batch.
    pub fn checkpoint_path(&self) -> PathBuf {
        let mut name = self.output.as_os_str().to_os_string();
        name.push(".checkpoint.json");
        PathBuf::from(name)
    }
}

/// Strategy for computing replay clicks on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeMode {
    /// Derive clicks from the output file's row count
    #[default]
    Heuristic,
    /// Prefer the checkpoint sidecar when it agrees with the output file
    Checkpoint,
}

impl std::str::FromStr for ResumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heuristic" | "rows" => Ok(ResumeMode::Heuristic),
            "checkpoint" => Ok(ResumeMode::Checkpoint),
            _ => Err(format!("Unknown resume mode: {}. Use: heuristic, checkpoint", s)),
        }
    }
}

impl std::fmt::Display for ResumeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeMode::Heuristic => write!(f, "heuristic"),
            ResumeMode::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert_eq!(config.output, PathBuf::from("dataset.csv"));
        assert_eq!(config.items_per_click, 20);
        assert_eq!(config.detail_attempts, 3);
        assert_eq!(config.initial_load_secs, 10);
        assert_eq!(config.element_timeout_secs, 10);
        assert_eq!(config.popup_timeout_secs, 5);
        assert_eq!(config.resume, ResumeMode::Heuristic);
        assert!(config.driver_path.is_none());
        assert!(config.max_clicks.is_none());
        assert!(config.max_batches.is_none());
        assert!(!config.headless);
        assert!(!config.completeness_column);
    }

    #[test]
    fn test_resume_mode_parsing() {
        assert_eq!("heuristic".parse::<ResumeMode>().unwrap(), ResumeMode::Heuristic);
        assert_eq!("ROWS".parse::<ResumeMode>().unwrap(), ResumeMode::Heuristic);
        assert_eq!("Checkpoint".parse::<ResumeMode>().unwrap(), ResumeMode::Checkpoint);

        let err = "resume-everything".parse::<ResumeMode>().unwrap_err();
        assert!(err.contains("Unknown resume mode"));
    }

    #[test]
    fn test_resume_mode_display() {
        assert_eq!(ResumeMode::Heuristic.to_string(), "heuristic");
        assert_eq!(ResumeMode::Checkpoint.to_string(), "checkpoint");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            url = "http://127.0.0.1:8000/list"
            items_per_click = 10
            detail_attempts = 5
            resume = "checkpoint"
            completeness_column = true
            max_batches = 4
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "http://127.0.0.1:8000/list");
        assert_eq!(config.items_per_click, 10);
        assert_eq!(config.detail_attempts, 5);
        assert_eq!(config.resume, ResumeMode::Checkpoint);
        assert!(config.completeness_column);
        assert_eq!(config.max_batches, Some(4));
        // untouched fields keep their defaults
        assert_eq!(config.popup_timeout_secs, 5);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            output = "phones.csv"
            headless = true
            driver_path = "/usr/local/bin/chromedriver"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.output, PathBuf::from("phones.csv"));
        assert!(config.headless);
        assert_eq!(config.driver_path, Some(PathBuf::from("/usr/local/bin/chromedriver")));
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_clicks = 3").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.max_clicks, Some(3));
    }

    #[test]
    fn test_config_with_env() {
        let orig_url = std::env::var("PFC_URL").ok();
        let orig_output = std::env::var("PFC_OUTPUT").ok();

        std::env::set_var("PFC_URL", "http://localhost:3000/phones");
        std::env::set_var("PFC_OUTPUT", "/tmp/phones.csv");

        let config = Config::new().with_env();
        assert_eq!(config.url, "http://localhost:3000/phones");
        assert_eq!(config.output, PathBuf::from("/tmp/phones.csv"));

        match orig_url {
            Some(v) => std::env::set_var("PFC_URL", v),
            None => std::env::remove_var("PFC_URL"),
        }
        match orig_output {
            Some(v) => std::env::set_var("PFC_OUTPUT", v),
            None => std::env::remove_var("PFC_OUTPUT"),
        }
    }

    #[test]
    fn test_checkpoint_path() {
        let config = Config { output: PathBuf::from("out/dataset.csv"), ..Config::default() };
        assert_eq!(config.checkpoint_path(), PathBuf::from("out/dataset.csv.checkpoint.json"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.element_timeout(), Duration::from_secs(10));
        assert_eq!(config.popup_timeout(), Duration::from_secs(5));
        assert_eq!(config.initial_load(), Duration::from_secs(10));
    }
}
