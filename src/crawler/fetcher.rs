use crate::browser::BrowserSession;
use crate::error::{NavigationError, NavigationFailure};
use crate::results::{CrawlTarget, PageRecord};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// The only component allowed to navigate the session
///
/// Turns every provider outcome, including a hung navigation, into a
/// `PageRecord`.
pub struct PageFetcher<'a, S> {
    session: &'a S,
    page_timeout: Duration,
}

impl<'a, S: BrowserSession> PageFetcher<'a, S> {
    pub fn new(session: &'a S, page_timeout: Duration) -> Self {
        Self {
            session,
            page_timeout,
        }
    }

    /// Fetches `target`, returning it alongside the resulting record
    ///
    /// The record's URL is the page's final URL, which differs from the
    /// target's URL when the provider followed a redirect. That holds for
    /// failures too, whenever the provider reports where it ended up.
    pub async fn fetch(&self, target: CrawlTarget) -> (CrawlTarget, PageRecord) {
        let started = Instant::now();
        ::log::debug!("SCRAPE: {} (depth {})", target.url, target.depth);

        let navigation = match timeout(self.page_timeout, self.session.navigate(&target.url)).await
        {
            Ok(result) => result,
            Err(_) => Err(NavigationFailure::from(NavigationError::Timeout {
                after_ms: self.page_timeout.as_millis() as u64,
            })),
        };

        let record = match navigation {
            Ok(page) => {
                ::log::debug!(
                    "Fetched {} ({} links) in {:.2} seconds",
                    page.final_url,
                    page.raw_links.len(),
                    started.elapsed().as_secs_f64()
                );
                PageRecord::new(page.final_url, page.title, page.content, page.raw_links)
            }
            Err(NavigationFailure { final_url, error }) => {
                let url = final_url.unwrap_or_else(|| target.url.clone());
                if url != target.url {
                    ::log::warn!("Failed to fetch {} (ended at {}): {}", target.url, url, error);
                } else {
                    ::log::warn!("Failed to fetch {}: {}", target.url, error);
                }
                PageRecord::failed(url, error)
            }
        };

        (target, record)
    }
}
