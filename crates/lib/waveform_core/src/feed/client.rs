//! Cursor-threading feed state machine.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::mapping::map_event;
use super::{EventRepository, FeedFilter};
use crate::models::{Cursor, Event};

/// Result of one [`FeedClient::load_page`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged; `added` new events after de-duplication.
    Loaded { added: usize },
    /// Nothing was fetched: a load is already in flight, the feed is closed
    /// or exhausted.
    Skipped,
    /// The response arrived after a reset or close and was dropped.
    Stale,
    /// The repository failed; pagination stops.
    Failed,
}

/// Point-in-time copy of the feed state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub filter: FeedFilter,
    pub items: Vec<Event>,
    pub has_more: bool,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct FeedState {
    filter: FeedFilter,
    items: Vec<Event>,
    seen: HashSet<String>,
    cursor: Option<Cursor>,
    has_more: bool,
    loading_initial: bool,
    loading_more: bool,
    error: Option<String>,
    epoch: u64,
    closed: bool,
}

impl FeedState {
    fn new(filter: FeedFilter) -> Self {
        Self {
            filter,
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: None,
            has_more: true,
            loading_initial: false,
            loading_more: false,
            error: None,
            epoch: 0,
            closed: false,
        }
    }

    fn in_flight(&self) -> bool {
        self.loading_initial || self.loading_more
    }
}

/// One feed instance.
///
/// At most one page load is in flight at a time. Every load captures the
/// current epoch; [`reset`](Self::reset) and [`close`](Self::close) bump it so
/// that late responses are discarded. The state lock is never held across the
/// repository call.
pub struct FeedClient {
    repository: Arc<dyn EventRepository>,
    state: Mutex<FeedState>,
}

impl FeedClient {
    /// Create an empty feed. Nothing is fetched until the first load.
    pub fn new(repository: Arc<dyn EventRepository>, filter: FeedFilter) -> Self {
        Self {
            repository,
            state: Mutex::new(FeedState::new(filter)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let s = self.lock();
        FeedSnapshot {
            filter: s.filter.clone(),
            items: s.items.clone(),
            has_more: s.has_more,
            loading_initial: s.loading_initial,
            loading_more: s.loading_more,
            error: s.error.clone(),
        }
    }

    /// Switch to `filter`, dropping everything loaded so far, and load its
    /// first page.
    pub async fn reset(&self, filter: FeedFilter) -> LoadOutcome {
        {
            let mut s = self.lock();
            if s.closed {
                return LoadOutcome::Skipped;
            }
            let epoch = s.epoch + 1;
            *s = FeedState {
                epoch,
                ..FeedState::new(filter)
            };
            debug!(epoch, "feed reset");
        }
        self.load_page(true).await
    }

    /// Load the first page (`is_initial`) or the page after the current cursor.
    pub async fn load_page(&self, is_initial: bool) -> LoadOutcome {
        let (epoch, mode, request) = {
            let mut s = self.lock();
            if s.closed || s.in_flight() || (!s.has_more && !is_initial) {
                return LoadOutcome::Skipped;
            }
            if is_initial {
                s.loading_initial = true;
            } else {
                s.loading_more = true;
            }
            s.error = None;
            let cursor = if is_initial { None } else { s.cursor.clone() };
            (s.epoch, s.filter.mode, s.filter.to_request(cursor))
        };

        let result = self.repository.fetch_page(mode, &request).await;

        let mut s = self.lock();
        if s.closed || s.epoch != epoch {
            debug!(epoch, current = s.epoch, "discarding stale feed page");
            return LoadOutcome::Stale;
        }
        s.loading_initial = false;
        s.loading_more = false;

        match result {
            Ok(page) => {
                if is_initial {
                    s.items.clear();
                    s.seen.clear();
                }
                let mut added = 0;
                for event in page.events.iter().filter_map(map_event) {
                    if s.seen.insert(event.id.clone()) {
                        s.items.push(event);
                        added += 1;
                    }
                }
                s.has_more = page.last_event_key.is_some();
                s.cursor = page.last_event_key;
                debug!(
                    mode = mode.as_str(),
                    added,
                    total = s.items.len(),
                    has_more = s.has_more,
                    "feed page loaded"
                );
                LoadOutcome::Loaded { added }
            }
            Err(e) => {
                warn!(mode = mode.as_str(), error = %e, "feed page failed");
                s.has_more = false;
                s.error = Some(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// The end-of-list marker became visible: fetch the next page if there is
    /// one and nothing is loading.
    pub async fn on_sentinel_visible(&self) -> LoadOutcome {
        {
            let s = self.lock();
            if !s.has_more || s.loading_more {
                return LoadOutcome::Skipped;
            }
        }
        self.load_page(false).await
    }

    /// Stop the feed; in-flight responses are ignored from now on.
    pub fn close(&self) {
        let mut s = self.lock();
        s.closed = true;
        s.epoch += 1;
        s.loading_initial = false;
        s.loading_more = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Semaphore;

    use super::*;
    use crate::client::ClientError;
    use crate::feed::{FeedError, FeedMode};
    use crate::models::{FeedPage, FeedRequest};

    fn ev(id: &str) -> Value {
        json!({"id": id, "title": format!("Event {id}")})
    }

    fn page(ids: &[&str], next: Option<&str>) -> FeedPage {
        FeedPage {
            events: ids.iter().map(|id| ev(id)).collect(),
            last_event_key: next.map(Cursor::from),
        }
    }

    fn ids(client: &FeedClient) -> Vec<String> {
        client.snapshot().items.into_iter().map(|e| e.id).collect()
    }

    /// Replays queued pages and records requests. With a gate, each fetch
    /// waits for a permit before answering.
    #[derive(Default)]
    struct ScriptedRepository {
        pages: Mutex<VecDeque<Result<FeedPage, FeedError>>>,
        requests: Mutex<Vec<(FeedMode, FeedRequest)>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedRepository {
        fn with_pages(pages: Vec<Result<FeedPage, FeedError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn requests(&self) -> Vec<(FeedMode, FeedRequest)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventRepository for ScriptedRepository {
        async fn fetch_page(
            &self,
            mode: FeedMode,
            request: &FeedRequest,
        ) -> Result<FeedPage, FeedError> {
            self.requests.lock().unwrap().push((mode, request.clone()));
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(FeedPage::default()))
        }
    }

    async fn wait_for_requests(repo: &ScriptedRepository, n: usize) {
        while repo.requests().len() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn pages_concatenate_until_cursor_runs_out() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![
            Ok(page(&["1", "2"], Some("k1"))),
            Ok(page(&["3"], Some("k2"))),
            Ok(page(&["4", "5"], None)),
        ]));
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories());

        assert_eq!(client.load_page(true).await, LoadOutcome::Loaded { added: 2 });
        assert_eq!(client.on_sentinel_visible().await, LoadOutcome::Loaded { added: 1 });
        assert_eq!(client.on_sentinel_visible().await, LoadOutcome::Loaded { added: 2 });
        assert_eq!(client.on_sentinel_visible().await, LoadOutcome::Skipped);

        let snap = client.snapshot();
        assert_eq!(ids(&client), ["1", "2", "3", "4", "5"]);
        assert!(!snap.has_more);
        assert!(!snap.loading_initial && !snap.loading_more);
        assert_eq!(repo.requests().len(), 3);
    }

    #[tokio::test]
    async fn cursor_is_threaded_from_response_to_next_request() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![
            Ok(page(&["1"], Some("k1"))),
            Ok(page(&["2"], Some("k2"))),
            Ok(page(&["3"], None)),
        ]));
        let client = FeedClient::new(
            repo.clone(),
            FeedFilter::breaking_news().with_category("science"),
        );
        client.load_page(true).await;
        client.load_page(false).await;
        client.load_page(false).await;

        let cursors: Vec<_> = repo
            .requests()
            .into_iter()
            .map(|(_, r)| r.last_event_key)
            .collect();
        assert_eq!(cursors, vec![None, Some(Cursor::from("k1")), Some(Cursor::from("k2"))]);

        let (mode, first) = &repo.requests()[0];
        assert_eq!(*mode, FeedMode::BreakingNews);
        assert_eq!(first.tags, Some(vec!["science".to_string()]));
        assert_eq!(first.min_significance, 0);
    }

    #[tokio::test]
    async fn concurrent_loads_issue_one_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let repo = Arc::new(
            ScriptedRepository::with_pages(vec![Ok(page(&["1"], Some("k1")))]).gated(gate.clone()),
        );
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories());

        let release = async {
            wait_for_requests(&repo, 1).await;
            gate.add_permits(1);
        };
        let (a, b, c, ()) = tokio::join!(
            client.load_page(true),
            client.load_page(true),
            client.on_sentinel_visible(),
            release,
        );

        assert_eq!(a, LoadOutcome::Loaded { added: 1 });
        assert_eq!(b, LoadOutcome::Skipped);
        assert_eq!(c, LoadOutcome::Skipped);
        assert_eq!(repo.requests().len(), 1);
    }

    #[tokio::test]
    async fn reset_discards_in_flight_page_for_old_filter() {
        let gate = Arc::new(Semaphore::new(0));
        let repo = Arc::new(
            ScriptedRepository::with_pages(vec![
                Ok(page(&["tech-1", "tech-2"], Some("t"))),
                Ok(page(&["sci-1"], None)),
            ])
            .gated(gate.clone()),
        );
        let client = Arc::new(FeedClient::new(
            repo.clone(),
            FeedFilter::top_stories().with_category("technology"),
        ));

        let old = tokio::spawn({
            let client = client.clone();
            async move { client.load_page(true).await }
        });
        wait_for_requests(&repo, 1).await;

        let new = tokio::spawn({
            let client = client.clone();
            async move {
                client
                    .reset(FeedFilter::top_stories().with_category("science"))
                    .await
            }
        });
        wait_for_requests(&repo, 2).await;

        // The semaphore is FIFO: the old load gets the first permit and page.
        gate.add_permits(1);
        assert_eq!(old.await.unwrap(), LoadOutcome::Stale);
        assert!(client.snapshot().loading_initial, "new load still pending");

        gate.add_permits(1);
        assert_eq!(new.await.unwrap(), LoadOutcome::Loaded { added: 1 });

        let snap = client.snapshot();
        assert_eq!(ids(&client), ["sci-1"]);
        assert_eq!(snap.filter.category.as_deref(), Some("science"));
        assert!(!snap.has_more);
    }

    #[tokio::test]
    async fn reset_clears_previous_items() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![
            Ok(page(&["1", "2"], Some("k1"))),
            Ok(page(&["9"], Some("k9"))),
        ]));
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories());
        client.load_page(true).await;
        client.reset(FeedFilter::breaking_news()).await;

        assert_eq!(ids(&client), ["9"]);
        let (mode, req) = &repo.requests()[1];
        assert_eq!(*mode, FeedMode::BreakingNews);
        assert_eq!(req.last_event_key, None);
    }

    #[tokio::test]
    async fn close_ignores_late_responses() {
        let gate = Arc::new(Semaphore::new(0));
        let repo = Arc::new(
            ScriptedRepository::with_pages(vec![Ok(page(&["1"], Some("k1")))])
                .gated(gate.clone()),
        );
        let client = Arc::new(FeedClient::new(repo.clone(), FeedFilter::top_stories()));

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.load_page(true).await }
        });
        wait_for_requests(&repo, 1).await;
        client.close();
        gate.add_permits(1);

        assert_eq!(pending.await.unwrap(), LoadOutcome::Stale);
        assert!(client.snapshot().items.is_empty());
        assert_eq!(client.load_page(true).await, LoadOutcome::Skipped);
        assert_eq!(
            client.reset(FeedFilter::top_stories()).await,
            LoadOutcome::Skipped
        );
        assert_eq!(repo.requests().len(), 1);
    }

    #[tokio::test]
    async fn failure_stops_pagination_and_keeps_items() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![
            Ok(page(&["1", "2"], Some("k1"))),
            Err(FeedError::Client(ClientError::Api {
                status: 500,
                message: "API key not configured".into(),
            })),
        ]));
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories());
        client.load_page(true).await;
        assert_eq!(client.on_sentinel_visible().await, LoadOutcome::Failed);

        let snap = client.snapshot();
        assert_eq!(ids(&client), ["1", "2"]);
        assert!(!snap.has_more);
        assert_eq!(snap.error.as_deref(), Some("API key not configured"));
        assert_eq!(client.on_sentinel_visible().await, LoadOutcome::Skipped);
    }

    #[tokio::test]
    async fn duplicate_ids_across_pages_are_dropped() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![
            Ok(page(&["1", "2"], Some("k1"))),
            Ok(page(&["2", "3"], None)),
        ]));
        let client = FeedClient::new(repo, FeedFilter::top_stories());
        client.load_page(true).await;
        assert_eq!(client.load_page(false).await, LoadOutcome::Loaded { added: 1 });
        assert_eq!(ids(&client), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn next_page_without_more_is_skipped() {
        let repo = Arc::new(ScriptedRepository::with_pages(vec![Ok(page(&["1"], None))]));
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories());
        client.load_page(true).await;
        assert_eq!(client.load_page(false).await, LoadOutcome::Skipped);
        assert_eq!(repo.requests().len(), 1);
    }

    #[tokio::test]
    async fn drives_the_in_memory_repository() {
        let repo = Arc::new(crate::feed::InMemoryEventRepository::with_fixtures());
        let client = FeedClient::new(repo.clone(), FeedFilter::top_stories().with_limit(5));
        client.load_page(true).await;
        while client.on_sentinel_visible().await != LoadOutcome::Skipped {}
        assert_eq!(client.snapshot().items.len(), 8);
        assert_eq!(repo.fetch_count(), 2);
    }
}
