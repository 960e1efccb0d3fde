//! Discovery feed: an incrementally loaded, cached view of the catalog.
//!
//! - `feed` holds the page cache and its fetch state machine
//! - `cache` drives it against a catalog client with retry and timeouts

mod cache;
mod feed;

pub use cache::{DiscoveryCache, FeedSubscription, LoadOutcome, RefreshOutcome};
pub use feed::{FetchState, Freshness, PageEntry};
