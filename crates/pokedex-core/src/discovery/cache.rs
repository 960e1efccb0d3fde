//! Discovery pagination cache.
//!
//! Fetches the catalog one page at a time, strictly in offset order. A page
//! is the listing plus every entity detail on it; details are requested
//! concurrently, each under its own timeout, and the page only commits once
//! all of them arrived. Any failure retries the whole page with exponential
//! backoff.

use super::feed::{Feed, FetchState, Freshness, PageEntry, Trigger};
use crate::config::DiscoveryConfig;
use crate::models::Pokemon;
use crate::network::{retry_async, DynCatalogClient, RetryStats};
use crate::{PokedexError, Result};
use futures::future::try_join_all;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What a load-more trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This trigger fetched and committed the page at `offset`.
    Loaded {
        offset: u32,
        /// Ids the page added to the feed. Repeats of earlier pages don't count.
        added: usize,
        attempts: u32,
    },
    /// Another fetch is already running; this trigger was coalesced into it.
    InFlight,
    /// The catalog has no more pages.
    Exhausted,
    /// The last page failed; call [`DiscoveryCache::retry`].
    NeedsRetry,
}

/// What a refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Resident pages were refetched and replaced.
    Refreshed { pages: usize },
    /// Nothing loaded, or a fetch is already running.
    Skipped,
}

struct FetchedPage {
    entities: Vec<Pokemon>,
    is_last: bool,
}

/// Paginated, cached view over a [`crate::network::CatalogClient`].
pub struct DiscoveryCache {
    client: DynCatalogClient,
    config: DiscoveryConfig,
    feed: Mutex<Feed>,
}

impl DiscoveryCache {
    pub fn new(client: DynCatalogClient, config: DiscoveryConfig) -> Self {
        Self {
            client,
            config,
            feed: Mutex::new(Feed::default()),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Fetch the next page unless a fetch is running, the feed is exhausted,
    /// or the last page failed.
    ///
    /// Returns the page error when this call ran the fetch and every attempt
    /// failed. Nothing from a failed page is committed.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let offset = match self.lock().begin_fetch() {
            Trigger::Start { offset } => offset,
            Trigger::InFlight => {
                debug!("Load-more ignored, page fetch already in flight");
                return Ok(LoadOutcome::InFlight);
            }
            Trigger::Exhausted => return Ok(LoadOutcome::Exhausted),
            Trigger::NeedsRetry => return Ok(LoadOutcome::NeedsRetry),
        };

        let mut guard = FetchGuard {
            cache: self,
            offset,
            armed: true,
        };
        let (result, stats) = self.fetch_page(offset).await;
        guard.armed = false;

        let mut feed = self.lock();
        match result {
            Ok(page) => {
                let before = feed.len();
                let entry = PageEntry {
                    offset,
                    entities: page.entities,
                    is_last: page.is_last,
                    fetched_at: Instant::now(),
                };
                feed.complete(offset, self.config.page_size, entry);
                let added = feed.len() - before;
                info!(
                    "Loaded page at offset {} ({} pokemon, {} attempts)",
                    offset, added, stats.attempts
                );
                if !feed.has_more() {
                    info!("Catalog exhausted after {} pages", feed.pages().len());
                }
                Ok(LoadOutcome::Loaded {
                    offset,
                    added,
                    attempts: stats.attempts,
                })
            }
            Err(e) => {
                let failure = page_failure(offset, &stats, e);
                error!("{}", failure);
                feed.fail(offset, failure.to_string());
                Err(failure)
            }
        }
    }

    /// The "try again" trigger: clear a failed page and fetch it again.
    pub async fn retry(&self) -> Result<LoadOutcome> {
        if self.lock().clear_failure() {
            info!("Retrying failed page");
        }
        self.load_more().await
    }

    /// Refetch every resident page, replacing them only if all succeed.
    ///
    /// On failure the old pages stay in place and are still served.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some((offsets, previous)) = self.lock().begin_refresh() else {
            return Ok(RefreshOutcome::Skipped);
        };
        debug!("Refreshing {} resident pages", offsets.len());

        let mut guard = RefreshGuard {
            cache: self,
            previous: Some(previous),
        };
        let mut pages = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let (result, stats) = self.fetch_page(offset).await;
            match result {
                Ok(page) => {
                    let is_last = page.is_last;
                    pages.push(PageEntry {
                        offset,
                        entities: page.entities,
                        is_last,
                        fetched_at: Instant::now(),
                    });
                    if is_last {
                        break;
                    }
                }
                Err(e) => {
                    let failure = page_failure(offset, &stats, e);
                    warn!("Refresh failed, keeping cached pages: {}", failure);
                    return Err(failure);
                }
            }
        }

        let count = pages.len();
        guard.previous = None;
        self.lock().finish_refresh(pages, self.config.page_size);
        info!("Refreshed {} pages", count);
        Ok(RefreshOutcome::Refreshed { pages: count })
    }

    /// Register an observer of the feed.
    ///
    /// Expired pages are evicted first, so the returned subscription's
    /// [`FeedSubscription::freshness`] tells the caller whether to load,
    /// reuse, or reuse-and-refresh.
    pub fn subscribe(self: &Arc<Self>) -> FeedSubscription {
        self.evict_unused();
        let freshness = {
            let mut feed = self.lock();
            feed.subscribe();
            feed.freshness(Instant::now(), self.config.stale_after)
        };
        FeedSubscription {
            cache: Arc::clone(self),
            freshness,
        }
    }

    /// Drop all pages if no subscription has been alive for the retention window.
    pub fn evict_unused(&self) -> bool {
        let evicted = self
            .lock()
            .evict_if_unused(Instant::now(), self.config.retain_for);
        if evicted {
            info!(
                "Evicted discovery pages unused for {:?}",
                self.config.retain_for
            );
        }
        evicted
    }

    /// Flattened view of every loaded pokemon, in fetch order.
    pub fn entities(&self) -> Vec<Pokemon> {
        self.lock().entities()
    }

    pub fn pages(&self) -> Vec<PageEntry> {
        self.lock().pages().to_vec()
    }

    /// Number of pokemon in [`Self::entities`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// False once the catalog reported its last page.
    pub fn has_more(&self) -> bool {
        self.lock().has_more()
    }

    pub fn state(&self) -> FetchState {
        self.lock().state().clone()
    }

    /// Message of the page failure awaiting a retry.
    pub fn last_error(&self) -> Option<String> {
        match self.lock().state() {
            FetchState::Failed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    pub fn freshness(&self) -> Freshness {
        self.lock().freshness(Instant::now(), self.config.stale_after)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers()
    }

    async fn fetch_page(&self, offset: u32) -> (Result<FetchedPage>, RetryStats) {
        retry_async(
            &self.config.retry,
            |attempt| self.fetch_page_once(offset, attempt),
            PokedexError::is_retryable,
        )
        .await
    }

    async fn fetch_page_once(&self, offset: u32, attempt: u32) -> Result<FetchedPage> {
        debug!("Fetching page at offset {} (attempt {})", offset, attempt + 1);
        let listing = self
            .bounded(self.client.list_page(offset, self.config.page_size))
            .await?;

        let entities = try_join_all(
            listing
                .results
                .iter()
                .map(|summary| self.bounded(self.client.get_detail(&summary.name))),
        )
        .await?;

        Ok(FetchedPage {
            entities,
            is_last: listing.is_last(),
        })
    }

    /// Bound a single request by the configured timeout.
    async fn bounded<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| PokedexError::Timeout(timeout))?
    }

    fn lock(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn page_failure(offset: u32, stats: &RetryStats, cause: PokedexError) -> PokedexError {
    PokedexError::PageFetchFailed {
        offset,
        attempts: stats.attempts,
        message: cause.to_string(),
    }
}

/// Returns the feed to Idle if a load-more future is dropped mid-fetch.
struct FetchGuard<'a> {
    cache: &'a DiscoveryCache,
    offset: u32,
    armed: bool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Page fetch at offset {} abandoned", self.offset);
            self.cache.lock().abandon(self.offset);
        }
    }
}

/// Restores the pre-refresh state if a refresh fails or its future is dropped.
struct RefreshGuard<'a> {
    cache: &'a DiscoveryCache,
    previous: Option<FetchState>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!("Refresh abandoned, keeping cached pages");
            self.cache.lock().abort_refresh(previous);
        }
    }
}

/// An observer of the discovery feed. Dropping it starts the retention clock
/// once no other subscription is alive.
pub struct FeedSubscription {
    cache: Arc<DiscoveryCache>,
    freshness: Freshness,
}

impl FeedSubscription {
    /// Freshness of the feed at the moment of subscribing.
    pub fn freshness(&self) -> Freshness {
        self.freshness
    }
}

impl std::ops::Deref for FeedSubscription {
    type Target = DiscoveryCache;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.cache.lock().unsubscribe(Instant::now());
    }
}
