//! Plain HTTP provider
//!
//! Fetches documents with `reqwest` instead of a real browser. Scripts are not
//! executed, so `content` is the markup as served. Redirects are followed and
//! the final URL is reported back to the crawler.

use crate::browser::{BrowserProvider, BrowserSession, Navigation};
use crate::error::{LaunchError, NavigationError, NavigationFailure};
use crate::parsers::{self, html};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

/// Provider backed by an HTTP client
#[derive(Debug, Clone)]
pub struct HttpProvider {
    user_agent: String,
    timeout: Duration,
    page_contexts: usize,
}

impl HttpProvider {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(10),
            page_contexts: 5,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many requests a session serves in parallel
    pub fn with_page_contexts(mut self, page_contexts: usize) -> Self {
        self.page_contexts = page_contexts.max(1);
        self
    }
}

impl BrowserProvider for HttpProvider {
    type Session = HttpSession;

    async fn launch(&self) -> Result<HttpSession, LaunchError> {
        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        ::log::debug!("HTTP session ready ({} contexts)", self.page_contexts);
        Ok(HttpSession {
            client,
            timeout: self.timeout,
            page_contexts: self.page_contexts,
        })
    }
}

/// A shared HTTP client; every in-flight request is its own page context
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    timeout: Duration,
    page_contexts: usize,
}

impl BrowserSession for HttpSession {
    async fn navigate(&self, url: &str) -> Result<Navigation, NavigationFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if final_url != url {
            ::log::debug!("Redirected {} -> {}", url, final_url);
        }

        if !status.is_success() {
            return Err(NavigationFailure::at(
                final_url,
                NavigationError::Status(status.as_u16()),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !parsers::is_html_content_type(&content_type) {
            return Err(NavigationFailure::at(
                final_url,
                NavigationError::NotHtml(content_type),
            ));
        }

        let content = response
            .text()
            .await
            .map_err(|e| NavigationFailure::at(final_url.as_str(), self.classify(e)))?;
        let parsed = html::parse(&content);

        Ok(Navigation {
            final_url,
            title: parsed.title,
            content,
            raw_links: parsed.links,
        })
    }

    fn page_contexts(&self) -> usize {
        self.page_contexts
    }

    async fn close(self) {
        ::log::debug!("HTTP session closed");
    }
}

impl HttpSession {
    fn classify(&self, error: reqwest::Error) -> NavigationError {
        if error.is_timeout() {
            NavigationError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }
        } else if error.is_redirect() {
            NavigationError::Network(format!("redirect limit exceeded: {error}"))
        } else {
            NavigationError::Network(error.to_string())
        }
    }
}
