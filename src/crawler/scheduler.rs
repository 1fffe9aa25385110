use crate::browser::{BrowserProvider, BrowserSession};
use crate::config::CrawlerConfig;
use crate::crawler::aggregator::ResultAggregator;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::normalize::normalize;
use crate::crawler::visited::VisitedSet;
use crate::error::CrawlError;
use crate::filter::{ScopeConfig, ScopeFilter};
use crate::results::{CrawlResult, CrawlTarget, PageRecord};
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Breadth-first, depth-bounded crawler over a browser provider
pub struct Crawler<P> {
    provider: P,
    max_concurrency: usize,
    page_timeout: Duration,
    total_timeout: Option<Duration>,
    max_links_per_page: Option<usize>,
    scope: ScopeConfig,
}

enum Event {
    Cancelled,
    DeadlineReached,
    Fetched(CrawlTarget, PageRecord),
}

impl<P: BrowserProvider> Crawler<P> {
    /// Create a crawler that fetches one page at a time
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_concurrency: 1,
            page_timeout: Duration::from_secs(10),
            total_timeout: None,
            max_links_per_page: None,
            scope: ScopeConfig::default(),
        }
    }

    /// Create a crawler using the limits from a configuration
    pub fn from_config(provider: P, config: &CrawlerConfig) -> Self {
        Self {
            provider,
            max_concurrency: config.max_concurrency.max(1),
            page_timeout: config.page_timeout(),
            total_timeout: config.total_timeout(),
            max_links_per_page: config.max_links_per_page,
            scope: config.scope.clone(),
        }
    }

    /// Set the maximum number of pages fetched at the same time
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Set the per-page navigation timeout
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Set the total timeout (partial results are returned when it passes)
    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }

    /// Cap the number of new targets taken from a single page
    pub fn with_max_links_per_page(mut self, max_links: usize) -> Self {
        self.max_links_per_page = Some(max_links);
        self
    }

    /// Restrict which links are followed
    pub fn with_scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }

    /// Crawl from `start_url`, following links at most `max_depth` hops away
    pub async fn run(&self, start_url: &str, max_depth: usize) -> Result<CrawlResult, CrawlError> {
        self.run_with_cancel(start_url, max_depth, CancellationToken::new())
            .await
    }

    /// Like [`Crawler::run`], stopping early once `cancel` is triggered
    ///
    /// Cancellation is not an error: pages fetched so far, including the
    /// ones in flight when the signal arrived, are returned.
    pub async fn run_with_cancel(
        &self,
        start_url: &str,
        max_depth: usize,
        cancel: CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        let start = parse_start_url(start_url)?;
        let scope = ScopeFilter::new(&self.scope, &start)?;

        ::log::info!("Starting crawl of {} (max depth {})", start, max_depth);
        let session = self.provider.launch().await?;

        let traversal = AssertUnwindSafe(self.traverse(&session, &scope, start, max_depth, &cancel))
            .catch_unwind()
            .await;

        // Runs on every exit path, including a panic inside the traversal
        session.close().await;

        match traversal {
            Ok(result) => {
                ::log::info!(
                    "Crawl complete - {} pages ({} with errors)",
                    result.len(),
                    result.error_count()
                );
                Ok(result)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn traverse<S: BrowserSession>(
        &self,
        session: &S,
        scope: &ScopeFilter,
        start: Url,
        max_depth: usize,
        cancel: &CancellationToken,
    ) -> CrawlResult {
        let visited = VisitedSet::new();
        let aggregator = ResultAggregator::new();
        let fetcher = PageFetcher::new(session, self.page_timeout);
        let concurrency = self.max_concurrency.min(session.page_contexts()).max(1);
        let deadline = self.total_timeout.map(|timeout| Instant::now() + timeout);

        let mut queue = VecDeque::new();
        visited.try_reserve(start.as_str()).await;
        queue.push_back(CrawlTarget::new(start, 0));

        let mut in_flight = FuturesUnordered::new();
        let mut stopping = false;

        loop {
            if !stopping
                && (cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d))
            {
                ::log::info!("Crawl stopped before issuing further fetches");
                stopping = true;
            }

            if !stopping {
                while in_flight.len() < concurrency {
                    let Some(target) = queue.pop_front() else {
                        break;
                    };
                    if visited.is_claimed(&target.url).await {
                        ::log::debug!("Skipping {}, already recorded through a redirect", target.url);
                        continue;
                    }
                    in_flight.push(fetcher.fetch(target));
                }
            }

            if in_flight.is_empty() {
                break;
            }

            let event = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !stopping => Event::Cancelled,
                _ = deadline_reached(deadline), if !stopping => Event::DeadlineReached,
                Some((target, record)) = in_flight.next() => Event::Fetched(target, record),
                else => break,
            };

            match event {
                Event::Cancelled => {
                    ::log::info!(
                        "Crawl cancelled, waiting for {} in-flight pages",
                        in_flight.len()
                    );
                    stopping = true;
                }
                Event::DeadlineReached => {
                    ::log::info!(
                        "Total timeout reached, waiting for {} in-flight pages",
                        in_flight.len()
                    );
                    stopping = true;
                }
                Event::Fetched(target, record) => {
                    let discovered = self
                        .complete(&visited, &aggregator, scope, target, record, max_depth, stopping)
                        .await;
                    queue.extend(discovered);
                }
            }
        }

        if stopping {
            if !queue.is_empty() {
                ::log::info!("Dropping {} queued targets", queue.len());
            }
        } else {
            let (reserved, recorded) = (visited.len().await, aggregator.len().await);
            if reserved != recorded {
                ::log::error!(
                    "Visited set holds {} URLs but {} pages were recorded",
                    reserved,
                    recorded
                );
            }
        }

        aggregator.into_result()
    }

    /// Records a fetched page and reserves the targets it leads to
    async fn complete(
        &self,
        visited: &VisitedSet,
        aggregator: &ResultAggregator,
        scope: &ScopeFilter,
        target: CrawlTarget,
        mut record: PageRecord,
        max_depth: usize,
        stopping: bool,
    ) -> Vec<CrawlTarget> {
        let final_url = canonical_url(&record.url).unwrap_or_else(|| target.url.clone());
        if final_url != target.url {
            let newly_reserved = visited.redirect(&target.url, &final_url).await;
            ::log::debug!(
                "{} redirected to {} ({})",
                target.url,
                final_url,
                if newly_reserved { "new" } else { "already reserved" }
            );
        }
        // The first fetch to land on a URL records it, and a queued target
        // for the same URL is then skipped
        if !visited.claim(&final_url).await {
            ::log::debug!(
                "{} is already recorded, dropping the fetch of {}",
                final_url,
                target.url
            );
            return Vec::new();
        }
        record.url = final_url;

        let mut discovered = Vec::new();
        if record.is_success() && target.depth < max_depth && !stopping {
            match Url::parse(&record.url) {
                Ok(base) => {
                    for link in normalize(&record.links, &base) {
                        if let Some(cap) = self.max_links_per_page
                            && discovered.len() >= cap
                        {
                            ::log::debug!("Link cap of {} reached on {}", cap, record.url);
                            break;
                        }
                        if !scope.allows(&link) {
                            ::log::trace!("Scope filter rejected: {}", link);
                            continue;
                        }
                        if visited.try_reserve(link.as_str()).await {
                            ::log::trace!("Queuing link for crawling: {}", link);
                            discovered.push(target.child(link));
                        }
                    }
                }
                Err(e) => ::log::warn!("Cannot resolve links on {}: {}", record.url, e),
            }
        }

        ::log::debug!(
            "Completed {} at depth {}, {} new targets",
            record.url,
            target.depth,
            discovered.len()
        );
        if let Err(e) = aggregator.record(record).await {
            ::log::error!("{}; keeping the first record", e);
        }

        discovered
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Parses a URL reported by the provider and drops its fragment
fn canonical_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);
    Some(parsed.into())
}

fn parse_start_url(start_url: &str) -> Result<Url, CrawlError> {
    let invalid = |reason: String| CrawlError::InvalidStartUrl {
        url: start_url.to_string(),
        reason,
    };

    let trimmed = start_url.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty URL".to_string()));
    }

    let mut url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    url.set_fragment(None);
    Ok(url)
}
