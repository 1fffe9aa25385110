use std::collections::HashSet;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    /// Every URL reserved during the run, aliases included
    reserved: HashSet<String>,
    /// Reserved URLs that redirected elsewhere
    aliases: HashSet<String>,
    /// URLs that already produced their page record
    claimed: HashSet<String>,
}

/// URLs scheduled or completed during one crawl run
///
/// Entries are never removed. Reservation is the only way in, so a URL
/// discovered by several pages at once becomes a target exactly once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<Inner>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically reserves `url`, returning false if it was already taken
    pub async fn try_reserve(&self, url: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.reserved.contains(url) {
            ::log::trace!("Skipping already visited or queued: {}", url);
            return false;
        }
        inner.reserved.insert(url.to_string());
        true
    }

    /// Records that the reserved `from` landed on `to`
    ///
    /// `from` stays reserved as an alias so it is never fetched again.
    /// Returns whether `to` was newly reserved by this call; false means
    /// another target already owns `to`.
    pub async fn redirect(&self, from: &str, to: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.aliases.insert(from.to_string());
        inner.reserved.insert(to.to_string())
    }

    /// Marks `url` as recorded, returning false if a page already claimed it
    pub async fn claim(&self, url: &str) -> bool {
        self.inner.lock().await.claimed.insert(url.to_string())
    }

    /// Whether a fetched page, possibly one that redirected here, was
    /// already recorded under `url`
    pub async fn is_claimed(&self, url: &str) -> bool {
        self.inner.lock().await.claimed.contains(url)
    }

    #[cfg(test)]
    pub async fn contains(&self, url: &str) -> bool {
        self.inner.lock().await.reserved.contains(url)
    }

    /// Number of canonical (non-alias) entries
    pub async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.reserved.len() - inner.aliases.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Canonical entries in lexical order
    #[cfg(test)]
    pub async fn urls(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut urls: Vec<String> = inner
            .reserved
            .difference(&inner.aliases)
            .cloned()
            .collect();
        urls.sort();
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reserve_once() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty().await);
        assert!(visited.try_reserve("https://example.com/").await);
        assert!(!visited.try_reserve("https://example.com/").await);
        assert!(visited.contains("https://example.com/").await);
        assert_eq!(visited.len().await, 1);
    }

    #[tokio::test]
    async fn test_redirect_keeps_alias_reserved() {
        let visited = VisitedSet::new();
        assert!(visited.try_reserve("http://example.com/").await);
        assert!(visited.redirect("http://example.com/", "https://example.com/").await);

        // Neither the original nor the final URL can be reserved again
        assert!(!visited.try_reserve("http://example.com/").await);
        assert!(!visited.try_reserve("https://example.com/").await);
        assert_eq!(visited.urls().await, vec!["https://example.com/"]);
        assert_eq!(visited.len().await, 1);
    }

    #[tokio::test]
    async fn test_redirect_to_owned_url() {
        let visited = VisitedSet::new();
        assert!(visited.try_reserve("https://example.com/a").await);
        assert!(visited.try_reserve("https://example.com/b").await);
        assert!(!visited.redirect("https://example.com/a", "https://example.com/b").await);
        assert_eq!(visited.urls().await, vec!["https://example.com/b"]);
    }

    #[tokio::test]
    async fn test_claim_once() {
        let visited = VisitedSet::new();
        assert!(visited.try_reserve("https://example.com/old").await);
        assert!(visited.try_reserve("https://example.com/new").await);
        assert!(!visited.is_claimed("https://example.com/new").await);

        // /old landed on the still queued /new and records it first
        visited.redirect("https://example.com/old", "https://example.com/new").await;
        assert!(visited.claim("https://example.com/new").await);
        assert!(visited.is_claimed("https://example.com/new").await);
        assert!(!visited.claim("https://example.com/new").await);
        assert_eq!(visited.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations() {
        let visited = Arc::new(VisitedSet::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let visited = Arc::clone(&visited);
            handles.push(tokio::spawn(async move {
                let mut won = 0;
                for i in 0..50 {
                    if visited.try_reserve(&format!("https://example.com/{i}")).await {
                        won += 1;
                    }
                }
                won
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 50);
        assert_eq!(visited.len().await, 50);
    }
}
