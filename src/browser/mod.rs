//! Browser automation providers
//!
//! The crawler only needs three primitives from a browser: launch a session,
//! navigate a page context to a URL and read back what was rendered, and
//! close the session. Any headless browser or HTTP client that can do this
//! implements [`BrowserProvider`].

pub mod http;
pub mod webdriver;

pub use http::HttpProvider;
pub use webdriver::WebDriverProvider;

use crate::error::{LaunchError, NavigationFailure};
use std::future::Future;

/// Rendered state of a page after navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// URL the browser ended up on, after any redirects
    pub final_url: String,
    /// Document title, empty if none
    pub title: String,
    /// Full document markup
    pub content: String,
    /// Raw `href` of every anchor, in document order
    pub raw_links: Vec<String>,
}

/// Starts browser sessions
pub trait BrowserProvider: Send + Sync {
    type Session: BrowserSession;

    /// Acquire a live session; failure here is fatal for a crawl run
    fn launch(&self) -> impl Future<Output = Result<Self::Session, LaunchError>> + Send;
}

/// An exclusively held browser with one or more page contexts
pub trait BrowserSession: Send + Sync {
    /// Navigate a free page context to `url` and extract its state
    ///
    /// Concurrent calls must each use their own page context; implementations
    /// wait for a free context when all are busy. A failure reports the URL
    /// the context ended up on whenever the provider knows it.
    fn navigate(&self, url: &str)
    -> impl Future<Output = Result<Navigation, NavigationFailure>> + Send;

    /// Number of navigations this session can serve at the same time
    fn page_contexts(&self) -> usize {
        1
    }

    /// Release the session and everything it holds
    fn close(self) -> impl Future<Output = ()> + Send;
}
