//! Depth-bounded crawl over a browser session
//!
//! The [`Crawler`] seeds a FIFO queue with the start URL, hands targets to the
//! [`PageFetcher`], runs discovered links through the normalizer and scope
//! filter, reserves them in the [`VisitedSet`] and collects one record per
//! URL in the [`ResultAggregator`].

pub mod aggregator;
pub mod fetcher;
pub mod normalize;
pub mod scheduler;
pub mod visited;


pub use aggregator::ResultAggregator;
pub use fetcher::PageFetcher;
pub use normalize::{normalize, normalize_link};
pub use scheduler::Crawler;
pub use visited::VisitedSet;
