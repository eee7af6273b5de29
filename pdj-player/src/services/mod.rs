//! Remote service integration
//!
//! The player consumes three external collaborators: the account service
//! (authorize redirect, delegated entirely), the catalog/search API, and
//! the playlist-publish API. Preview assets are fetched and decoded through
//! the [`assets::AssetProvider`] seam.

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod publish;

pub use assets::{AssetProvider, HttpAssetProvider};
pub use auth::AccessToken;
pub use catalog::{CatalogClient, TrackRecord};
pub use publish::PublishClient;
