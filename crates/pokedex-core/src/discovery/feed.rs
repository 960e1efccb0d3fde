//! Feed state machine.
//!
//! Every transition of the discovery feed lives here as a plain method on
//! [`Feed`], without any I/O. [`super::DiscoveryCache`] drives it from the
//! async side and never holds the feed lock across an await.

use crate::models::Pokemon;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// One successfully fetched page. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub offset: u32,
    pub entities: Vec<Pokemon>,
    /// The catalog reported no page after this one.
    pub is_last: bool,
    pub fetched_at: Instant,
}

/// Where the feed is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    /// Cursor known, nothing in flight.
    Idle,
    /// A page request for `offset` is outstanding.
    Fetching { offset: u32 },
    /// Resident pages are being refetched.
    Refreshing,
    /// The page at `offset` failed after all retries. Needs an explicit retry.
    Failed { offset: u32, message: String },
    /// The catalog has no more pages.
    Exhausted,
}

impl FetchState {
    pub fn is_busy(&self) -> bool {
        matches!(self, FetchState::Fetching { .. } | FetchState::Refreshing)
    }
}

/// Age of the resident pages relative to the staleness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing loaded yet.
    Empty,
    /// Everything was fetched within the staleness window.
    Fresh,
    /// Some page is older than the staleness window. Still servable.
    Stale,
}

/// Result of a load-more trigger against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Trigger {
    Start { offset: u32 },
    InFlight,
    Exhausted,
    NeedsRetry,
}

#[derive(Debug)]
pub(crate) struct Feed {
    pages: Vec<PageEntry>,
    /// Next offset to request, `None` once exhausted.
    cursor: Option<u32>,
    state: FetchState,
    subscribers: usize,
    last_unsubscribed: Option<Instant>,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            cursor: Some(0),
            state: FetchState::Idle,
            subscribers: 0,
            last_unsubscribed: None,
        }
    }
}

impl Feed {
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn cursor(&self) -> Option<u32> {
        self.cursor
    }

    pub fn pages(&self) -> &[PageEntry] {
        &self.pages
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn subscribers(&self) -> usize {
        self.subscribers
    }

    /// Concatenation of all pages in fetch order, each id kept once.
    pub fn entities(&self) -> Vec<Pokemon> {
        let mut seen = HashSet::new();
        self.pages
            .iter()
            .flat_map(|page| page.entities.iter())
            .filter(|p| seen.insert(p.id))
            .cloned()
            .collect()
    }

    /// Number of distinct ids across all pages, i.e. `entities().len()`.
    pub fn len(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|page| page.entities.iter())
            .map(|p| p.id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Idle → Fetching. Every other state leaves the feed untouched.
    pub fn begin_fetch(&mut self) -> Trigger {
        match &self.state {
            FetchState::Fetching { .. } | FetchState::Refreshing => Trigger::InFlight,
            FetchState::Failed { .. } => Trigger::NeedsRetry,
            FetchState::Exhausted => Trigger::Exhausted,
            FetchState::Idle => match self.cursor {
                Some(offset) => {
                    self.state = FetchState::Fetching { offset };
                    Trigger::Start { offset }
                }
                None => {
                    self.state = FetchState::Exhausted;
                    Trigger::Exhausted
                }
            },
        }
    }

    /// Fetching → Idle or Exhausted, committing the page.
    ///
    /// Returns false (and commits nothing) if the feed is no longer fetching
    /// `offset`.
    pub fn complete(&mut self, offset: u32, page_size: u32, page: PageEntry) -> bool {
        if self.state != (FetchState::Fetching { offset }) {
            return false;
        }
        if page.is_last {
            self.cursor = None;
            self.state = FetchState::Exhausted;
        } else {
            self.cursor = Some(offset.saturating_add(page_size));
            self.state = FetchState::Idle;
        }
        self.pages.push(page);
        true
    }

    /// Fetching → Failed. The cursor stays on the failed page.
    pub fn fail(&mut self, offset: u32, message: String) {
        if self.state == (FetchState::Fetching { offset }) {
            self.state = FetchState::Failed { offset, message };
        }
    }

    /// Fetching → Idle when the caller stopped waiting before settling.
    pub fn abandon(&mut self, offset: u32) {
        if self.state == (FetchState::Fetching { offset }) {
            self.state = FetchState::Idle;
        }
    }

    /// Failed → Idle. Returns whether the feed was failed.
    pub fn clear_failure(&mut self) -> bool {
        if matches!(self.state, FetchState::Failed { .. }) {
            self.state = FetchState::Idle;
            true
        } else {
            false
        }
    }

    /// Enter Refreshing and return the offsets to refetch, or `None` if busy
    /// or empty. The previous state is returned for restoring on failure.
    pub fn begin_refresh(&mut self) -> Option<(Vec<u32>, FetchState)> {
        if self.state.is_busy() || self.pages.is_empty() {
            return None;
        }
        let offsets = self.pages.iter().map(|p| p.offset).collect();
        let previous = std::mem::replace(&mut self.state, FetchState::Refreshing);
        Some((offsets, previous))
    }

    /// Refreshing → Idle or Exhausted with the refetched pages in place.
    pub fn finish_refresh(&mut self, pages: Vec<PageEntry>, page_size: u32) {
        if self.state != FetchState::Refreshing {
            return;
        }
        match pages.last() {
            Some(last) if last.is_last => {
                self.cursor = None;
                self.state = FetchState::Exhausted;
            }
            Some(last) => {
                self.cursor = Some(last.offset.saturating_add(page_size));
                self.state = FetchState::Idle;
            }
            None => {
                self.cursor = Some(0);
                self.state = FetchState::Idle;
            }
        }
        self.pages = pages;
    }

    /// Refreshing → the state held before the refresh, pages untouched.
    pub fn abort_refresh(&mut self, previous: FetchState) {
        if self.state == FetchState::Refreshing {
            self.state = previous;
        }
    }

    pub fn freshness(&self, now: Instant, stale_after: Duration) -> Freshness {
        match self.pages.iter().map(|p| p.fetched_at).min() {
            None => Freshness::Empty,
            Some(oldest) if now.saturating_duration_since(oldest) >= stale_after => {
                Freshness::Stale
            }
            Some(_) => Freshness::Fresh,
        }
    }

    pub fn subscribe(&mut self) {
        self.subscribers += 1;
    }

    pub fn unsubscribe(&mut self, now: Instant) {
        self.subscribers = self.subscribers.saturating_sub(1);
        if self.subscribers == 0 {
            self.last_unsubscribed = Some(now);
        }
    }

    /// Drop every page if nobody has observed the feed for `retain_for`.
    pub fn evict_if_unused(&mut self, now: Instant, retain_for: Duration) -> bool {
        let idle_since = match self.last_unsubscribed {
            Some(at) if self.subscribers == 0 => at,
            _ => return false,
        };
        if self.state.is_busy()
            || (self.pages.is_empty() && self.cursor == Some(0))
            || now.saturating_duration_since(idle_since) < retain_for
        {
            return false;
        }
        self.pages.clear();
        self.cursor = Some(0);
        self.state = FetchState::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PokemonStats, PLACEHOLDER_IMAGE};

    fn mon(id: u32) -> Pokemon {
        Pokemon {
            id,
            name: format!("Pokemon {}", id),
            image: PLACEHOLDER_IMAGE.to_string(),
            types: vec![],
            stats: PokemonStats::default(),
        }
    }

    fn page(offset: u32, ids: &[u32], is_last: bool) -> PageEntry {
        PageEntry {
            offset,
            entities: ids.iter().copied().map(mon).collect(),
            is_last,
            fetched_at: Instant::now(),
        }
    }

    #[test]
    fn test_triggers_while_fetching_are_ignored() {
        let mut feed = Feed::default();
        assert_eq!(feed.begin_fetch(), Trigger::Start { offset: 0 });
        assert_eq!(feed.begin_fetch(), Trigger::InFlight);
        assert_eq!(feed.begin_fetch(), Trigger::InFlight);
        assert_eq!(feed.state(), &FetchState::Fetching { offset: 0 });
    }

    #[test]
    fn test_success_advances_cursor() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        assert!(feed.complete(0, 2, page(0, &[1, 2], false)));
        assert_eq!(feed.cursor(), Some(2));
        assert_eq!(feed.state(), &FetchState::Idle);
        assert_eq!(feed.begin_fetch(), Trigger::Start { offset: 2 });
    }

    #[test]
    fn test_last_page_exhausts() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], true));
        assert!(!feed.has_more());
        assert_eq!(feed.state(), &FetchState::Exhausted);
        assert_eq!(feed.begin_fetch(), Trigger::Exhausted);
    }

    #[test]
    fn test_failure_keeps_cursor_until_retry() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], false));
        feed.begin_fetch();
        feed.fail(2, "timeout".to_string());

        assert_eq!(feed.cursor(), Some(2));
        assert_eq!(feed.begin_fetch(), Trigger::NeedsRetry);
        assert_eq!(feed.entities().len(), 2);

        assert!(feed.clear_failure());
        assert_eq!(feed.begin_fetch(), Trigger::Start { offset: 2 });
    }

    #[test]
    fn test_complete_for_other_offset_is_rejected() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        assert!(!feed.complete(6, 6, page(6, &[7], false)));
        assert!(feed.pages().is_empty());
    }

    #[test]
    fn test_flattened_view_keeps_first_of_each_id() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], false));
        feed.begin_fetch();
        feed.complete(2, 2, page(2, &[2, 3], false));

        let ids: Vec<u32> = feed.entities().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_refresh_replaces_pages() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], false));

        let (offsets, previous) = feed.begin_refresh().unwrap();
        assert_eq!(offsets, vec![0]);
        assert_eq!(previous, FetchState::Idle);
        assert_eq!(feed.begin_fetch(), Trigger::InFlight);
        assert!(feed.begin_refresh().is_none());

        feed.finish_refresh(vec![page(0, &[1, 2], true)], 2);
        assert_eq!(feed.state(), &FetchState::Exhausted);
    }

    #[test]
    fn test_aborted_refresh_restores_state() {
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], true));

        let (_, previous) = feed.begin_refresh().unwrap();
        feed.abort_refresh(previous);
        assert_eq!(feed.state(), &FetchState::Exhausted);
        assert_eq!(feed.pages().len(), 1);
    }

    #[test]
    fn test_freshness_windows() {
        let mut feed = Feed::default();
        let stale_after = Duration::from_secs(300);
        let now = Instant::now();
        assert_eq!(feed.freshness(now, stale_after), Freshness::Empty);

        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], false));
        let fetched = feed.pages()[0].fetched_at;
        assert_eq!(feed.freshness(fetched, stale_after), Freshness::Fresh);
        assert_eq!(
            feed.freshness(fetched + stale_after, stale_after),
            Freshness::Stale
        );
    }

    #[test]
    fn test_eviction_requires_no_subscribers_and_elapsed_retention() {
        let retain_for = Duration::from_secs(1800);
        let mut feed = Feed::default();
        feed.begin_fetch();
        feed.complete(0, 2, page(0, &[1, 2], false));

        let start = Instant::now();
        // never observed through a subscription
        assert!(!feed.evict_if_unused(start + retain_for, retain_for));

        feed.subscribe();
        feed.unsubscribe(start);
        assert!(!feed.evict_if_unused(start + Duration::from_secs(60), retain_for));

        feed.subscribe();
        assert!(!feed.evict_if_unused(start + retain_for, retain_for));
        feed.unsubscribe(start);

        assert!(feed.evict_if_unused(start + retain_for, retain_for));
        assert!(feed.pages().is_empty());
        assert_eq!(feed.cursor(), Some(0));
        assert_eq!(feed.state(), &FetchState::Idle);
    }
}
