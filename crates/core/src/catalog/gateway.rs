use std::collections::HashSet;

use tracing::{info, warn};

use super::client::{FetchError, GameCatalogClient, RawGameDetail, RawGameList};
use crate::models::{CatalogListState, GameDetail, GameId, GameSummary};

/// Maps catalog responses onto UI-ready state values.
///
/// The plain `fetch_*` operations never fail: a failed request yields the
/// default state and a warning in the log. `fetch_*_reported` apply the same
/// fallback and also return the replaced error; `try_fetch_*` skip the
/// fallback entirely.
#[derive(Debug, Clone)]
pub struct CatalogGateway<C> {
    client: C,
}

impl<C: GameCatalogClient> CatalogGateway<C> {
    /// Wrap a catalog client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the game list, falling back to an empty list on failure.
    pub async fn fetch_list(&self) -> CatalogListState {
        self.fetch_list_reported().await.0
    }

    /// Like [`fetch_list`](Self::fetch_list), but also hands back the error
    /// the fallback replaced.
    pub async fn fetch_list_reported(&self) -> (CatalogListState, Option<FetchError>) {
        match self.try_fetch_list().await {
            Ok(state) => (state, None),
            Err(err) => {
                warn!(%err, "game list fetch failed; showing empty list");
                (CatalogListState::default(), Some(err))
            }
        }
    }

    /// Fetch and map the game list.
    pub async fn try_fetch_list(&self) -> Result<CatalogListState, FetchError> {
        let raw = self.client.list_games().await?;
        let state = list_state(raw);
        info!(count = state.count, loaded = state.len(), "game list fetched");
        Ok(state)
    }

    /// Fetch one game, falling back to the default detail on failure.
    pub async fn fetch_detail(&self, id: GameId) -> GameDetail {
        self.fetch_detail_reported(id).await.0
    }

    /// Like [`fetch_detail`](Self::fetch_detail), but also hands back the
    /// error the fallback replaced.
    pub async fn fetch_detail_reported(&self, id: GameId) -> (GameDetail, Option<FetchError>) {
        match self.try_fetch_detail(id).await {
            Ok(detail) => (detail, None),
            Err(err) => {
                warn!(id, %err, "game detail fetch failed; showing defaults");
                (GameDetail::default(), Some(err))
            }
        }
    }

    /// Fetch and map one game.
    pub async fn try_fetch_detail(&self, id: GameId) -> Result<GameDetail, FetchError> {
        let raw = self.client.get_game(id).await?;
        Ok(detail_state(id, raw))
    }
}

fn list_state(raw: RawGameList) -> CatalogListState {
    let mut seen = HashSet::with_capacity(raw.results.len());
    let mut items = Vec::with_capacity(raw.results.len());
    for entry in raw.results {
        if !seen.insert(entry.id) {
            warn!(id = entry.id, "dropping duplicate game id from list response");
            continue;
        }
        items.push(GameSummary {
            id: entry.id,
            name: entry.name.unwrap_or_default(),
            background_image: entry.background_image.unwrap_or_default(),
        });
    }

    CatalogListState {
        count: raw.count,
        items,
    }
}

fn detail_state(id: GameId, raw: RawGameDetail) -> GameDetail {
    let metacritic = match raw.metacritic {
        Some(score) if (0..=100).contains(&score) => score,
        Some(score) => {
            warn!(id, score, "metacritic score out of range; treating as absent");
            GameDetail::NO_SCORE
        }
        None => GameDetail::NO_SCORE,
    };

    GameDetail {
        name: raw.name.unwrap_or_default(),
        description: raw.description_raw.unwrap_or_default(),
        metacritic,
        website: raw
            .website
            .unwrap_or_else(|| GameDetail::NO_WEBSITE.to_string()),
        background_image: raw.background_image.unwrap_or_default(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::{HashMap, VecDeque},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use super::*;
    use crate::catalog::client::RawGameEntry;

    /// Scripted in-memory catalog used by gateway and view-state tests.
    #[derive(Clone, Default)]
    pub(crate) struct FakeCatalog {
        inner: Arc<FakeInner>,
    }

    #[derive(Default)]
    struct FakeInner {
        list: Mutex<Option<RawGameList>>,
        scripted_lists: Mutex<VecDeque<(Duration, RawGameList)>>,
        details: Mutex<HashMap<GameId, RawGameDetail>>,
        delays: Mutex<HashMap<GameId, Duration>>,
        list_calls: AtomicUsize,
        detail_calls: AtomicUsize,
    }

    fn unavailable() -> FetchError {
        FetchError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            url: "http://catalog.test/games".to_string(),
        }
    }

    impl FakeCatalog {
        pub(crate) fn with_list(self, list: RawGameList) -> Self {
            *self.inner.list.lock() = Some(list);
            self
        }

        /// Queue a one-shot list response served after `delay`, ahead of
        /// the fixed list.
        pub(crate) fn with_list_response(self, delay: Duration, list: RawGameList) -> Self {
            self.inner.scripted_lists.lock().push_back((delay, list));
            self
        }

        pub(crate) fn with_detail(self, id: GameId, detail: RawGameDetail) -> Self {
            self.inner.details.lock().insert(id, detail);
            self
        }

        pub(crate) fn with_delay(self, id: GameId, delay: Duration) -> Self {
            self.inner.delays.lock().insert(id, delay);
            self
        }

        pub(crate) fn list_calls(&self) -> usize {
            self.inner.list_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn detail_calls(&self) -> usize {
            self.inner.detail_calls.load(Ordering::SeqCst)
        }
    }

    impl GameCatalogClient for FakeCatalog {
        async fn list_games(&self) -> Result<RawGameList, FetchError> {
            self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.inner.scripted_lists.lock().pop_front();
            if let Some((delay, list)) = scripted {
                tokio::time::sleep(delay).await;
                return Ok(list);
            }
            let list = self.inner.list.lock().clone();
            list.ok_or_else(unavailable)
        }

        async fn get_game(&self, id: GameId) -> Result<RawGameDetail, FetchError> {
            self.inner.detail_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.inner.delays.lock().get(&id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let detail = self.inner.details.lock().get(&id).cloned();
            detail.ok_or_else(unavailable)
        }
    }

    pub(crate) fn entry(id: GameId, name: &str) -> RawGameEntry {
        RawGameEntry {
            id,
            name: Some(name.to_string()),
            background_image: Some(format!("https://media.example/{id}.jpg")),
        }
    }

    pub(crate) fn portal_2() -> RawGameDetail {
        RawGameDetail {
            name: Some("Portal 2".to_string()),
            description_raw: Some("Co-op puzzles with portals.".to_string()),
            metacritic: None,
            website: None,
            background_image: Some("https://media.example/portal2.jpg".to_string()),
        }
    }

    #[tokio::test]
    async fn maps_list_entries_verbatim() {
        let catalog = FakeCatalog::default().with_list(RawGameList {
            count: 874_112,
            results: vec![entry(1, "The Witcher 3"), entry(2, "Portal 2")],
        });
        let gateway = CatalogGateway::new(catalog);

        let state = gateway.fetch_list().await;
        assert_eq!(state.count, 874_112);
        assert_eq!(state.len(), 2);
        assert_eq!(
            state.items[0],
            GameSummary {
                id: 1,
                name: "The Witcher 3".to_string(),
                background_image: "https://media.example/1.jpg".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn failed_list_collapses_to_default() {
        let gateway = CatalogGateway::new(FakeCatalog::default());

        let state = gateway.fetch_list().await;
        assert_eq!(state.count, 0);
        assert!(state.items.is_empty());
        assert!(gateway.try_fetch_list().await.is_err());
    }

    #[tokio::test]
    async fn reported_fetch_returns_fallback_and_error() {
        let gateway = CatalogGateway::new(FakeCatalog::default().with_detail(5, portal_2()));

        let (list, err) = gateway.fetch_list_reported().await;
        assert_eq!(list, CatalogListState::default());
        assert!(matches!(err, Some(FetchError::Status { .. })));

        let (detail, err) = gateway.fetch_detail_reported(42).await;
        assert_eq!(detail, GameDetail::default());
        assert!(err.is_some());

        let (detail, err) = gateway.fetch_detail_reported(5).await;
        assert_eq!(detail.name, "Portal 2");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_entry() {
        let catalog = FakeCatalog::default().with_list(RawGameList {
            count: 3,
            results: vec![entry(7, "First"), entry(8, "Other"), entry(7, "Second")],
        });

        let state = CatalogGateway::new(catalog).fetch_list().await;
        let names: Vec<_> = state.items.iter().map(|game| game.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Other"]);
    }

    #[tokio::test]
    async fn null_detail_fields_get_sentinels() {
        let catalog = FakeCatalog::default().with_detail(5, portal_2());

        let detail = CatalogGateway::new(catalog).fetch_detail(5).await;
        assert_eq!(detail.name, "Portal 2");
        assert_eq!(detail.metacritic, 111);
        assert_eq!(detail.website, "sin web");
        assert_eq!(detail.description, "Co-op puzzles with portals.");
    }

    #[tokio::test]
    async fn failed_detail_is_all_defaults() {
        let gateway = CatalogGateway::new(FakeCatalog::default());

        let detail = gateway.fetch_detail(42).await;
        assert_eq!(detail, GameDetail::default());
        assert_eq!(detail.metacritic, 111);
        assert_eq!(detail.website, "sin web");
        assert_eq!(detail.name, "");
        assert_eq!(detail.description, "");
        assert_eq!(detail.background_image, "");
    }

    #[tokio::test]
    async fn out_of_range_score_becomes_sentinel() {
        let raw = RawGameDetail {
            metacritic: Some(250),
            website: Some(String::new()),
            ..portal_2()
        };
        let catalog = FakeCatalog::default().with_detail(9, raw);

        let detail = CatalogGateway::new(catalog).fetch_detail(9).await;
        assert_eq!(detail.metacritic, GameDetail::NO_SCORE);
        assert_eq!(detail.website, "");
        assert_eq!(detail.website_url(), None);
    }

    #[tokio::test]
    async fn every_call_hits_the_client() {
        let catalog = FakeCatalog::default().with_detail(5, portal_2());
        let gateway = CatalogGateway::new(catalog.clone());

        gateway.fetch_detail(5).await;
        gateway.fetch_detail(5).await;
        gateway.fetch_list().await;
        assert_eq!(catalog.detail_calls(), 2);
        assert_eq!(catalog.list_calls(), 1);
    }
}
