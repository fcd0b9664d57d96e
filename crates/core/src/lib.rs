#![warn(clippy::all, missing_docs)]

//! Core logic for gamedex.
//!
//! This crate hosts the catalog models, configuration handling, the RAWG
//! HTTP client and gateway, and the observable view state consumed by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod state;

pub use catalog::{CatalogGateway, FetchError, GameCatalogClient, RawgClient};
pub use config::AppConfig;
pub use models::{CatalogListState, GameDetail, GameId, GameSummary};
pub use state::{CatalogViewState, LoadStatus, Observable};
