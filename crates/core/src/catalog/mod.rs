//! Access to the remote game catalog.

/// HTTP client for the catalog service.
pub mod client;
/// Response-to-state mapping.
pub mod gateway;

pub use client::{
    FetchError, GameCatalogClient, RawGameDetail, RawGameEntry, RawGameList, RawgClient,
};
pub use gateway::CatalogGateway;
