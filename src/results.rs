use crate::error::NavigationError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A URL accepted for fetching, with its distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized absolute URL
    pub url: String,

    /// Number of link hops from the start URL
    pub depth: usize,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    /// Target for a link discovered on this target's page
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self::new(url, self.depth + 1)
    }
}

/// Everything extracted from one page, or the reason it could not be
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// URL the page was finally loaded from (after redirects)
    #[serde(skip)]
    pub url: String,

    /// Title of the page, empty if it has none
    pub title: String,

    /// Full rendered document markup
    pub content: String,

    /// Raw href values found on the page, in document order
    pub links: Vec<String>,

    /// Set when the page could not be fetched
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<NavigationError>,
}

impl PageRecord {
    /// Create a record for a successfully fetched page
    pub fn new(url: String, title: String, content: String, links: Vec<String>) -> Self {
        Self {
            url,
            title,
            content,
            links,
            error: None,
        }
    }

    /// Create an error-tagged record with empty payload
    pub fn failed(url: String, error: NavigationError) -> Self {
        Self {
            url,
            title: String::new(),
            content: String::new(),
            links: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_error<S>(error: &Option<NavigationError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Pages visited by one crawl run, keyed by URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrawlResult {
    pages: BTreeMap<String, PageRecord>,
}

impl CrawlResult {
    pub(crate) fn from_pages(pages: BTreeMap<String, PageRecord>) -> Self {
        Self { pages }
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Visited URLs in lexical order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageRecord)> {
        self.pages.iter().map(|(url, page)| (url.as_str(), page))
    }

    /// Number of pages that carry an error
    pub fn error_count(&self) -> usize {
        self.pages.values().filter(|page| !page.is_success()).count()
    }
}

impl IntoIterator for CrawlResult {
    type Item = (String, PageRecord);
    type IntoIter = std::collections::btree_map::IntoIter<String, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}
