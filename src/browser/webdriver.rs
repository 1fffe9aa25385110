use crate::browser::{BrowserProvider, BrowserSession, Navigation};
use crate::error::{LaunchError, NavigationError, NavigationFailure};
use crate::parsers::{self, html};
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Common local WebDriver endpoints tried when the configured one is down
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Reads the document content type and the HTTP status of the navigation
const DOCUMENT_STATE_SCRIPT: &str = r#"
const nav = performance.getEntriesByType('navigation')[0];
return {
    contentType: document.contentType || '',
    status: nav && nav.responseStatus ? nav.responseStatus : null
};
"#;

/// Provider that drives a browser through a WebDriver server
#[derive(Debug, Clone)]
pub struct WebDriverProvider {
    webdriver_url: String,
    headless: bool,
    page_load_strategy: String,
    page_load_timeout: Duration,
    page_contexts: usize,
    fallbacks: bool,
}

impl WebDriverProvider {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless: true,
            page_load_strategy: "eager".to_string(),
            page_load_timeout: Duration::from_secs(10),
            page_contexts: 1,
            fallbacks: true,
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// WebDriver page load strategy; "eager" returns at DOMContentLoaded
    pub fn with_page_load_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.page_load_strategy = strategy.into();
        self
    }

    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Number of WebDriver sessions opened to serve parallel navigations
    pub fn with_page_contexts(mut self, page_contexts: usize) -> Self {
        self.page_contexts = page_contexts.max(1);
        self
    }

    /// Whether the common local WebDriver ports are tried after the configured one
    pub fn with_fallbacks(mut self, fallbacks: bool) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Endpoints in the order they are tried
    fn endpoints(&self) -> Vec<String> {
        let mut endpoints = vec![self.webdriver_url.clone()];
        if self.fallbacks {
            endpoints.extend(
                FALLBACK_WEBDRIVER_URLS
                    .iter()
                    .filter(|url| **url != self.webdriver_url)
                    .map(|url| url.to_string()),
            );
        }
        endpoints
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert(
            "pageLoadStrategy".to_string(),
            json!(self.page_load_strategy),
        );
        if self.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    /// Connects to the configured WebDriver, then to the fallbacks
    async fn connect_with_fallback(&self) -> Result<(String, Client), LaunchError> {
        let capabilities = self.capabilities();
        let endpoints = self.endpoints();
        let mut last_error = String::new();

        for (i, url) in endpoints.iter().enumerate() {
            if i > 0 {
                ::log::info!("Trying fallback WebDriver URL: {}", url);
            }
            match connect(url, &capabilities).await {
                Ok(client) => {
                    ::log::debug!("Connected to WebDriver at {}", url);
                    return Ok((url.clone(), client));
                }
                Err(e) => {
                    ::log::error!("Failed to connect to WebDriver at {}: {}", url, e);
                    last_error = e.to_string();
                }
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(LaunchError::Unreachable {
            tried: endpoints.join(", "),
            reason: last_error,
        })
    }
}

async fn connect(webdriver_url: &str, capabilities: &Capabilities) -> Result<Client, NewSessionError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());
    builder.connect(webdriver_url).await
}

fn page_load_timeouts(page_load: Duration) -> TimeoutConfiguration {
    TimeoutConfiguration::new(None, Some(page_load), None)
}

impl BrowserProvider for WebDriverProvider {
    type Session = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession, LaunchError> {
        let (webdriver_url, first) = self.connect_with_fallback().await?;

        let capabilities = self.capabilities();
        let mut clients = vec![first];
        while clients.len() < self.page_contexts {
            match connect(&webdriver_url, &capabilities).await {
                Ok(client) => clients.push(client),
                Err(e) => {
                    ::log::warn!(
                        "Opened {} of {} page contexts, continuing with fewer: {}",
                        clients.len(),
                        self.page_contexts,
                        e
                    );
                    break;
                }
            }
        }

        for client in &clients {
            if let Err(e) = client.update_timeouts(page_load_timeouts(self.page_load_timeout)).await {
                ::log::warn!("Failed to set page load timeout: {}", e);
            }
        }

        ::log::info!(
            "WebDriver session ready at {} with {} page contexts",
            webdriver_url,
            clients.len()
        );

        Ok(WebDriverSession {
            webdriver_url,
            capabilities,
            page_load_timeout: self.page_load_timeout,
            permits: Semaphore::new(clients.len()),
            page_contexts: clients.len(),
            idle: Mutex::new(clients),
        })
    }
}

/// Pool of WebDriver clients, one per page context
pub struct WebDriverSession {
    webdriver_url: String,
    capabilities: Capabilities,
    page_load_timeout: Duration,
    permits: Semaphore,
    page_contexts: usize,
    idle: Mutex<Vec<Client>>,
}

/// Returns a checked-out client to the pool even if the navigation is dropped
struct ContextGuard<'a> {
    pool: &'a Mutex<Vec<Client>>,
    client: Option<Client>,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(client);
        }
    }
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<Navigation, NavigationFailure> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| NavigationError::Browser("session is closed".to_string()))?;

        let client = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or_else(|| NavigationError::Browser("no idle page context".to_string()))?;
        let mut guard = ContextGuard {
            pool: &self.idle,
            client: Some(client),
        };

        let mut result: Result<Navigation, NavigationFailure> =
            Err(NavigationError::Browser("navigation not attempted".to_string()).into());
        for attempt in 0..2 {
            if attempt > 0 {
                // Only a lost session is worth a second try
                if !matches!(
                    &result,
                    Err(NavigationFailure {
                        error: NavigationError::SessionLost(_),
                        ..
                    })
                ) {
                    break;
                }
                match self.reconnect().await {
                    Some(client) => guard.client = Some(client),
                    None => break,
                }
            }

            let Some(client) = guard.client.as_ref() else {
                break;
            };
            result = self.visit(client, url).await;
            if result.is_ok() {
                break;
            }
        }

        result
    }

    fn page_contexts(&self) -> usize {
        self.page_contexts
    }

    async fn close(self) {
        self.permits.close();
        let clients = self.idle.into_inner().unwrap_or_else(PoisonError::into_inner);
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver client: {}", e);
            }
        }
        ::log::debug!("WebDriver session closed");
    }
}

impl WebDriverSession {
    /// Navigates one client and reads back the rendered page
    async fn visit(&self, client: &Client, url: &str) -> Result<Navigation, NavigationFailure> {
        client.goto(url).await.map_err(|e| self.classify(e))?;

        let final_url = client
            .current_url()
            .await
            .map_err(|e| self.classify(e))?
            .to_string();
        let failed_at = |error: NavigationError| NavigationFailure::at(final_url.as_str(), error);

        let state = client
            .execute(DOCUMENT_STATE_SCRIPT, Vec::new())
            .await
            .map_err(|e| failed_at(self.classify(e)))?;
        check_document_state(&state).map_err(failed_at)?;

        let title = client
            .title()
            .await
            .map_err(|e| failed_at(self.classify(e)))?;
        let content = client
            .source()
            .await
            .map_err(|e| failed_at(self.classify(e)))?;
        let raw_links = html::parse_links_only(&content);

        ::log::debug!("Found {} links in {}", raw_links.len(), final_url);

        Ok(Navigation {
            final_url,
            title,
            content,
            raw_links,
        })
    }

    async fn reconnect(&self) -> Option<Client> {
        ::log::warn!("Attempting to reconnect WebDriver session");
        match connect(&self.webdriver_url, &self.capabilities).await {
            Ok(client) => {
                if let Err(e) = client.update_timeouts(page_load_timeouts(self.page_load_timeout)).await {
                    ::log::warn!("Failed to set page load timeout: {}", e);
                }
                ::log::info!("Successfully reconnected to WebDriver");
                Some(client)
            }
            Err(e) => {
                ::log::error!("Failed to reconnect to WebDriver: {}", e);
                None
            }
        }
    }

    fn classify(&self, error: CmdError) -> NavigationError {
        classify_message(&error.to_string(), self.page_load_timeout)
    }
}

fn classify_message(message: &str, page_load_timeout: Duration) -> NavigationError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("unable to find session") || lowered.contains("invalid session id") {
        NavigationError::SessionLost(message.to_string())
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        NavigationError::Timeout {
            after_ms: page_load_timeout.as_millis() as u64,
        }
    } else if lowered.contains("net::err_") || lowered.contains("neterror") {
        NavigationError::Network(message.to_string())
    } else {
        NavigationError::Browser(message.to_string())
    }
}

/// Rejects error statuses and documents the browser did not parse as HTML
fn check_document_state(state: &Value) -> Result<(), NavigationError> {
    if let Some(status) = state.get("status").and_then(Value::as_u64) {
        let status = u16::try_from(status).map_err(|_| {
            NavigationError::Browser(format!("invalid response status {status}"))
        })?;
        if !(200..300).contains(&status) {
            return Err(NavigationError::Status(status));
        }
    }

    let content_type = state
        .get("contentType")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !parsers::is_html_content_type(content_type) {
        return Err(NavigationError::NotHtml(content_type.to_string()));
    }
    Ok(())
}
