use crate::error::DuplicateRecord;
use crate::results::{CrawlResult, PageRecord};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tokio::sync::Mutex;

/// Collects one `PageRecord` per visited URL
#[derive(Debug, Default)]
pub struct ResultAggregator {
    pages: Mutex<BTreeMap<String, PageRecord>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under its URL
    ///
    /// A URL is recorded at most once; later records for the same URL are
    /// rejected and the first one is kept.
    pub async fn record(&self, record: PageRecord) -> Result<(), DuplicateRecord> {
        let mut pages = self.pages.lock().await;
        match pages.entry(record.url.clone()) {
            Entry::Occupied(entry) => Err(DuplicateRecord {
                url: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.pages.lock().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.pages.lock().await.is_empty()
    }

    /// Hands the collected pages over as the run's result
    pub fn into_result(self) -> CrawlResult {
        CrawlResult::from_pages(self.pages.into_inner())
    }
}
