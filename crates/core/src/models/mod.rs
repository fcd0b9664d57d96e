//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a game by the catalog service.
pub type GameId = i64;

/// One catalog entry as shown in the game list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Catalog identifier, unique within one list snapshot.
    pub id: GameId,
    /// Display name.
    pub name: String,
    /// Thumbnail image URL (may be empty).
    pub background_image: String,
}

/// Aggregate result of a list fetch.
///
/// Either the default (no items) or the full result of the last successful
/// fetch. Render with [`CatalogListState::len`]; `count` is what the service
/// reported for the whole catalog and rarely equals the page size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListState {
    /// Total count reported by the service.
    pub count: i64,
    /// Entries in service order.
    pub items: Vec<GameSummary>,
}

impl CatalogListState {
    /// Number of entries actually held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no entries are held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an entry by identifier.
    pub fn get(&self, id: GameId) -> Option<&GameSummary> {
        self.items.iter().find(|game| game.id == id)
    }
}

/// Full detail of a single game.
///
/// Absent values are encoded with sentinels rather than `Option` so the
/// default value is what a screen shows before (or instead of) a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    /// Display name.
    pub name: String,
    /// Plain-text description.
    pub description: String,
    /// Metacritic score in `0..=100`, or [`GameDetail::NO_SCORE`].
    pub metacritic: i32,
    /// Official website, or [`GameDetail::NO_WEBSITE`].
    pub website: String,
    /// Header image URL (may be empty).
    pub background_image: String,
}

impl GameDetail {
    /// Score sentinel, outside the valid `0..=100` range.
    pub const NO_SCORE: i32 = 111;
    /// Website sentinel.
    pub const NO_WEBSITE: &'static str = "sin web";

    /// Metacritic score, `None` when the sentinel is stored.
    pub fn score(&self) -> Option<u8> {
        if self.metacritic == Self::NO_SCORE {
            return None;
        }
        u8::try_from(self.metacritic)
            .ok()
            .filter(|score| *score <= 100)
    }

    /// Website URL, `None` for the sentinel or an empty value.
    pub fn website_url(&self) -> Option<&str> {
        match self.website.trim() {
            "" => None,
            url if url == Self::NO_WEBSITE => None,
            url => Some(url),
        }
    }

    /// True when every field holds its default.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for GameDetail {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            metacritic: Self::NO_SCORE,
            website: Self::NO_WEBSITE.to_string(),
            background_image: String::new(),
        }
    }
}

/// Return the games whose name contains `query`, ignoring case.
///
/// An empty query keeps every entry. Order is preserved.
pub fn filter_games(items: &[GameSummary], query: &str) -> Vec<GameSummary> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|game| game.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
