use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use super::{
    observable::Observable,
    scope::{RequestScope, Ticket},
};
use crate::{
    catalog::{CatalogGateway, FetchError, GameCatalogClient},
    models::{filter_games, CatalogListState, GameDetail, GameId, GameSummary},
};

/// Progress of the request behind a published value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Nothing requested since creation or the last reset.
    #[default]
    Idle,
    /// A request is in flight; the value still holds its previous content.
    Loading,
    /// The value came from a successful request.
    Ready {
        /// When the response was published.
        fetched_at: DateTime<Utc>,
    },
    /// The request failed and the value was reset to its default.
    Failed {
        /// Error text, safe to display.
        reason: String,
    },
}

impl LoadStatus {
    /// Status for a finished fetch, given the error its fallback replaced.
    fn after(err: Option<FetchError>) -> Self {
        match err {
            None => Self::Ready {
                fetched_at: Utc::now(),
            },
            Some(err) => Self::Failed {
                reason: err.to_string(),
            },
        }
    }

    /// True while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// True once the last request finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }
}

/// Observable state shared by the list, detail and search screens.
///
/// Fetches run on spawned Tokio tasks, so the `on_*_enter` operations must be
/// called from within a Tokio runtime. Dropping the view state aborts any
/// request still in flight.
pub struct CatalogViewState<C> {
    gateway: Arc<CatalogGateway<C>>,
    list: Observable<CatalogListState>,
    list_status: Observable<LoadStatus>,
    detail: Observable<GameDetail>,
    detail_status: Observable<LoadStatus>,
    query: Observable<String>,
    active: Observable<bool>,
    list_scope: RequestScope,
    detail_scope: RequestScope,
}

impl<C: GameCatalogClient> CatalogViewState<C> {
    /// Create empty state backed by `gateway`. Nothing is fetched yet.
    pub fn new(gateway: CatalogGateway<C>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            list: Observable::default(),
            list_status: Observable::default(),
            detail: Observable::default(),
            detail_status: Observable::default(),
            query: Observable::default(),
            active: Observable::new(false),
            list_scope: RequestScope::default(),
            detail_scope: RequestScope::default(),
        }
    }

    /// Start one list fetch in the background.
    ///
    /// Callers invoke this once per list screen lifecycle. A second call
    /// supersedes the first: its response is discarded.
    pub fn on_list_screen_enter(&self) {
        let ticket = self.list_scope.begin();
        self.list_status.set(LoadStatus::Loading);

        let gateway = Arc::clone(&self.gateway);
        let list = self.list.clone();
        let status = self.list_status.clone();
        let task_ticket = ticket.clone();
        let task = tokio::spawn(async move {
            load_list(&gateway, &task_ticket, &list, &status).await;
        });
        self.list_scope.track(&ticket, task.abort_handle());
    }

    /// Start one detail fetch for `id` in the background.
    pub fn on_detail_screen_enter(&self, id: GameId) {
        let ticket = self.detail_scope.begin();
        self.detail_status.set(LoadStatus::Loading);

        let gateway = Arc::clone(&self.gateway);
        let detail = self.detail.clone();
        let status = self.detail_status.clone();
        let task_ticket = ticket.clone();
        let task = tokio::spawn(async move {
            load_detail(&gateway, id, &task_ticket, &detail, &status).await;
        });
        self.detail_scope.track(&ticket, task.abort_handle());
    }

    /// Drop any in-flight detail request and reset the detail to defaults.
    pub fn on_detail_screen_exit(&self) {
        self.detail_scope.cancel();
        self.detail.set(GameDetail::default());
        self.detail_status.set(LoadStatus::Idle);
    }

    /// Fetch the list in place and publish it.
    pub async fn refresh_list(&self) {
        let ticket = self.list_scope.begin();
        self.list_status.set(LoadStatus::Loading);
        load_list(&self.gateway, &ticket, &self.list, &self.list_status).await;
    }

    /// Fetch one game in place and publish it.
    pub async fn refresh_detail(&self, id: GameId) {
        let ticket = self.detail_scope.begin();
        self.detail_status.set(LoadStatus::Loading);
        load_detail(&self.gateway, id, &ticket, &self.detail, &self.detail_status).await;
    }

    /// Replace the search text.
    pub fn set_query(&self, query: impl Into<String>) {
        self.query.set(query.into());
    }

    /// Mark the search bar as open or closed.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Current list entries whose name contains `query`, ignoring case.
    pub fn filtered_list(&self, query: &str) -> Vec<GameSummary> {
        self.list.with(|list| filter_games(&list.items, query))
    }

    pub fn list(&self) -> CatalogListState {
        self.list.get()
    }

    pub fn list_status(&self) -> LoadStatus {
        self.list_status.get()
    }

    pub fn detail(&self) -> GameDetail {
        self.detail.get()
    }

    pub fn detail_status(&self) -> LoadStatus {
        self.detail_status.get()
    }

    pub fn query(&self) -> String {
        self.query.get()
    }

    pub fn active(&self) -> bool {
        self.active.get()
    }

    pub fn subscribe_list(&self) -> watch::Receiver<CatalogListState> {
        self.list.subscribe()
    }

    pub fn subscribe_list_status(&self) -> watch::Receiver<LoadStatus> {
        self.list_status.subscribe()
    }

    pub fn subscribe_detail(&self) -> watch::Receiver<GameDetail> {
        self.detail.subscribe()
    }

    pub fn subscribe_detail_status(&self) -> watch::Receiver<LoadStatus> {
        self.detail_status.subscribe()
    }

    pub fn subscribe_query(&self) -> watch::Receiver<String> {
        self.query.subscribe()
    }

    pub fn subscribe_active(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }
}

async fn load_list<C: GameCatalogClient>(
    gateway: &CatalogGateway<C>,
    ticket: &Ticket,
    list: &Observable<CatalogListState>,
    status: &Observable<LoadStatus>,
) {
    let (state, err) = gateway.fetch_list_reported().await;
    let outcome = LoadStatus::after(err);

    let published = ticket.publish(move || {
        list.set(state);
        status.set(outcome);
    });
    if !published {
        debug!("discarding superseded game list response");
    }
}

async fn load_detail<C: GameCatalogClient>(
    gateway: &CatalogGateway<C>,
    id: GameId,
    ticket: &Ticket,
    detail: &Observable<GameDetail>,
    status: &Observable<LoadStatus>,
) {
    let (value, err) = gateway.fetch_detail_reported(id).await;
    let outcome = LoadStatus::after(err);

    let published = ticket.publish(move || {
        detail.set(value);
        status.set(outcome);
    });
    if !published {
        debug!(id, "discarding superseded game detail response");
    }
}
