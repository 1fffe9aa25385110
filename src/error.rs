use thiserror::Error;

/// Failures that stop a crawl run before any page is fetched
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid start URL {url:?}: {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("failed to launch browser session: {0}")]
    Launch(#[from] LaunchError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while acquiring a browser session
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no WebDriver server accepted a session (tried {tried}): {reason}")]
    Unreachable { tried: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Per-page navigation failures
///
/// These never abort a run; they are stored in the `PageRecord` of the URL
/// that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("navigation timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("not an HTML document (content type {0:?})")]
    NotHtml(String),

    #[error("browser session lost: {0}")]
    SessionLost(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// A failed navigation, with the URL the browser was left on when known
///
/// A redirect that ends on an error page still reports where it ended, so
/// the failure is recorded under that URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct NavigationFailure {
    pub final_url: Option<String>,
    pub error: NavigationError,
}

impl NavigationFailure {
    pub fn at(final_url: impl Into<String>, error: NavigationError) -> Self {
        Self {
            final_url: Some(final_url.into()),
            error,
        }
    }
}

impl From<NavigationError> for NavigationFailure {
    fn from(error: NavigationError) -> Self {
        Self {
            final_url: None,
            error,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// A second record was offered for a URL that already has one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("page already recorded for {url}")]
pub struct DuplicateRecord {
    pub url: String,
}
