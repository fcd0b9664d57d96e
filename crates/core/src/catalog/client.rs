use std::future::Future;

use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::{config::AppConfig, models::GameId};

const USER_AGENT: &str = concat!("gamedex/", env!("CARGO_PKG_VERSION"));

/// A failed request against the catalog service.
///
/// Callers treat every variant the same way; the split only records what
/// went wrong for logs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Request URL without its query string.
        url: String,
    },
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The body was not the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `GET /games` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGameList {
    /// Total number of games in the catalog.
    #[serde(default)]
    pub count: i64,
    /// One page of entries.
    #[serde(default)]
    pub results: Vec<RawGameEntry>,
}

/// Entry of [`RawGameList::results`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawGameEntry {
    /// Catalog identifier.
    pub id: GameId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Thumbnail URL.
    #[serde(default)]
    pub background_image: Option<String>,
}

/// `GET /games/{id}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGameDetail {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Description without HTML markup.
    #[serde(default)]
    pub description_raw: Option<String>,
    /// Metacritic score.
    #[serde(default)]
    pub metacritic: Option<i32>,
    /// Official website.
    #[serde(default)]
    pub website: Option<String>,
    /// Header image URL.
    #[serde(default)]
    pub background_image: Option<String>,
}

/// Read operations offered by the catalog service.
pub trait GameCatalogClient: Send + Sync + 'static {
    /// Fetch the game list.
    fn list_games(&self) -> impl Future<Output = Result<RawGameList, FetchError>> + Send;

    /// Fetch a single game by identifier.
    fn get_game(&self, id: GameId)
        -> impl Future<Output = Result<RawGameDetail, FetchError>> + Send;
}

/// [`GameCatalogClient`] backed by the RAWG REST API.
///
/// Not `Debug`: it carries the API key.
#[derive(Clone)]
pub struct RawgClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RawgClient {
    /// Build a client from configuration.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Self::with_http_client(http, config)
    }

    /// Build a client around an already configured `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            base: config.base()?,
            api_key: config.api_key.clone(),
        })
    }

    /// Root every request path is resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{path}", self.base.path()));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(url = %url, "catalog request");
        let response = self
            .http
            .get(url.clone())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(redact)?;
        debug!(url = %url, bytes = body.len(), "catalog response");
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Strip the request URL, and with it the API key, from transport errors.
fn redact(err: reqwest::Error) -> FetchError {
    FetchError::Transport(err.without_url())
}

impl GameCatalogClient for RawgClient {
    async fn list_games(&self) -> Result<RawGameList, FetchError> {
        self.get_json(self.endpoint("games")).await
    }

    async fn get_game(&self, id: GameId) -> Result<RawGameDetail, FetchError> {
        self.get_json(self.endpoint(&format!("games/{id}"))).await
    }
}
