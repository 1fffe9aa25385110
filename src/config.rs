use crate::error::ConfigError;
use crate::filter::ScopeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Which browser automation provider drives the crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A WebDriver server (ChromeDriver, geckodriver, ...)
    #[default]
    WebDriver,
    /// Plain HTTP fetches, no script execution
    Http,
}

/// Settings for the browser automation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub backend: Backend,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// WebDriver page load strategy ("normal", "eager" or "none")
    #[serde(default = "default_page_load_strategy")]
    pub page_load_strategy: String,

    /// User agent sent by the HTTP backend
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            page_load_strategy: default_page_load_strategy(),
            user_agent: default_user_agent(),
        }
    }
}

/// Configuration for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// URL to start crawling from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,

    /// Maximum number of link hops from the start URL
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of pages fetched at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-page navigation timeout
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Deadline for the whole run; partial results are returned when it passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout_secs: Option<u64>,

    /// Cap on the number of new targets enqueued from a single page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_links_per_page: Option<usize>,

    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_depth: default_max_depth(),
            max_concurrency: default_max_concurrency(),
            page_timeout_secs: default_page_timeout_secs(),
            total_timeout_secs: None,
            max_links_per_page: None,
            scope: ScopeConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl CrawlerConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: Some(start_url.to_string()),
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable if set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                ::log::debug!("Using WebDriver URL from environment: {}", webdriver_url);
                self.browser.webdriver_url = webdriver_url;
            }
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.page_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "page_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !matches!(
            self.browser.page_load_strategy.as_str(),
            "normal" | "eager" | "none"
        ) {
            return Err(ConfigError::Validation(format!(
                "unknown page_load_strategy {:?}",
                self.browser.page_load_strategy
            )));
        }
        for pattern in self
            .scope
            .include_patterns
            .iter()
            .chain(&self.scope.exclude_patterns)
        {
            regex::Regex::new(pattern)?;
        }
        Ok(())
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }
}

fn default_max_depth() -> usize {
    2
}

fn default_max_concurrency() -> usize {
    5
}

fn default_page_timeout_secs() -> u64 {
    10
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_page_load_strategy() -> String {
    "eager".to_string()
}

fn default_user_agent() -> String {
    concat!("depthcrawl/", env!("CARGO_PKG_VERSION")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = CrawlerConfig::from_json("{}").unwrap();
        assert_eq!(config.start_url, None);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.page_timeout(), Duration::from_secs(10));
        assert_eq!(config.total_timeout(), None);
        assert_eq!(config.browser.backend, Backend::WebDriver);
        assert_eq!(config.browser.webdriver_url, "http://localhost:4444");
        assert!(config.browser.headless);
        assert_eq!(config.browser.page_load_strategy, "eager");
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "start_url": "https://example.com",
            "max_depth": 0,
            "max_concurrency": 2,
            "total_timeout_secs": 60,
            "max_links_per_page": 5,
            "scope": { "same_domain": true, "exclude_patterns": ["\\.pdf$"] },
            "browser": { "backend": "http", "headless": false }
        }"#;
        let config = CrawlerConfig::from_json(json).unwrap();
        assert_eq!(config.start_url.as_deref(), Some("https://example.com"));
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.total_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.max_links_per_page, Some(5));
        assert!(config.scope.same_domain);
        assert_eq!(config.browser.backend, Backend::Http);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            CrawlerConfig::from_json(r#"{"max_concurrency": 0}"#),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            CrawlerConfig::from_json(r#"{"page_timeout_secs": 0}"#),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            CrawlerConfig::from_json(r#"{"browser": {"page_load_strategy": "lazy"}}"#),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            CrawlerConfig::from_json(r#"{"scope": {"include_patterns": ["("]}}"#),
            Err(ConfigError::InvalidPattern(_))
        ));
        assert!(matches!(
            CrawlerConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_depth": 3}}"#).unwrap();

        let config = CrawlerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_depth, 3);

        let missing = CrawlerConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
