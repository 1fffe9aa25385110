#![allow(clippy::too_many_arguments)]

pub mod browser;
pub mod config;
pub mod crawler;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod results;

// Re-export commonly used types for convenience
pub use browser::{BrowserProvider, BrowserSession, HttpProvider, Navigation, WebDriverProvider};
pub use config::{Backend, CrawlerConfig};
pub use crawler::Crawler;
pub use error::{CrawlError, LaunchError, NavigationError, NavigationFailure};
pub use results::{CrawlResult, CrawlTarget, PageRecord};
pub use tokio_util::sync::CancellationToken;

use error::ConfigError;

/// Crawl the configured start URL with the configured backend
pub async fn crawl(config: &CrawlerConfig) -> Result<CrawlResult, CrawlError> {
    crawl_with_cancel(config, CancellationToken::new()).await
}

/// Like [`crawl`], returning partial results once `cancel` is triggered
pub async fn crawl_with_cancel(
    config: &CrawlerConfig,
    cancel: CancellationToken,
) -> Result<CrawlResult, CrawlError> {
    config.validate()?;
    let start_url = config
        .start_url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("start_url is required".to_string()))?;

    match config.browser.backend {
        Backend::WebDriver => {
            let provider = WebDriverProvider::new(config.browser.webdriver_url.as_str())
                .with_headless(config.browser.headless)
                .with_page_load_strategy(config.browser.page_load_strategy.as_str())
                .with_page_load_timeout(config.page_timeout())
                .with_page_contexts(config.max_concurrency);
            Crawler::from_config(provider, config)
                .run_with_cancel(start_url, config.max_depth, cancel)
                .await
        }
        Backend::Http => {
            let provider = HttpProvider::new(config.browser.user_agent.as_str())
                .with_timeout(config.page_timeout())
                .with_page_contexts(config.max_concurrency);
            Crawler::from_config(provider, config)
                .run_with_cancel(start_url, config.max_depth, cancel)
                .await
        }
    }
}
