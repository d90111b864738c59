//! Catalog provider contract
//!
//! Each streaming service is reached through one [`CatalogProvider`]
//! implementation. The core never sees wire formats: adapters decode their
//! responses into typed DTOs and hand back validated domain entities.
//!
//! [`ProviderEntity`] and [`SavedEntity`] route a generic `E: CatalogEntity`
//! to the kind-specific provider method, so the reconciliation engine can be
//! written once for every kind.

use async_trait::async_trait;
use bridge_traits::error::Result;

use crate::models::{Album, Artist, CatalogEntity, Playlist, Track};

/// Operations every catalog provider must support
///
/// Listings are already flattened; pagination is the adapter's concern.
/// Searches are bounded (top results only) and may return an empty list.
/// Request failures are reported as
/// [`BridgeError::RequestFailed`](bridge_traits::error::BridgeError::RequestFailed)
/// and are never retried by the core.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Stable identifier used in mapping keys.
    fn name(&self) -> &str;

    async fn get_saved_artists(&self) -> Result<Vec<Artist>>;
    async fn get_saved_albums(&self) -> Result<Vec<Album>>;
    async fn get_saved_tracks(&self) -> Result<Vec<Track>>;

    /// Playlists including their tracks.
    async fn get_playlists(&self) -> Result<Vec<Playlist>>;

    async fn search_artist(&self, query: &str) -> Result<Vec<Artist>>;
    async fn search_album(&self, query: &str) -> Result<Vec<Album>>;
    async fn search_track(&self, query: &str) -> Result<Vec<Track>>;

    async fn get_artist(&self, id: &str) -> Result<Option<Artist>>;
    async fn get_album(&self, id: &str) -> Result<Option<Album>>;
    async fn get_track(&self, id: &str) -> Result<Option<Track>>;

    async fn add_saved_artists(&self, artists: &[Artist]) -> Result<()>;
    async fn add_saved_albums(&self, albums: &[Album]) -> Result<()>;
    async fn add_saved_tracks(&self, tracks: &[Track]) -> Result<()>;

    /// Create or update a playlist.
    ///
    /// An existing playlist is found by ID, then by name. Its full track list
    /// is replaced and its visibility and description updated. Returns the
    /// provider ID of the stored playlist.
    async fn add_playlist(&self, playlist: &Playlist) -> Result<String>;

    /// URL a user can open to look an item up by hand.
    fn get_search_url(&self, query: &str) -> String;
}

/// Entities a provider can list and accept for submission
#[async_trait]
pub trait ProviderEntity: CatalogEntity {
    /// Full listing of this kind from `provider`.
    async fn list(provider: &dyn CatalogProvider) -> Result<Vec<Self>>;

    /// Commit staged entities as one logical batch.
    async fn submit(provider: &dyn CatalogProvider, staged: &[Self]) -> Result<()>;
}

/// Entities that live in a user's saved library and can be searched for
#[async_trait]
pub trait SavedEntity: ProviderEntity {
    async fn search(provider: &dyn CatalogProvider, query: &str) -> Result<Vec<Self>>;

    async fn fetch(provider: &dyn CatalogProvider, id: &str) -> Result<Option<Self>>;
}

#[async_trait]
impl ProviderEntity for Artist {
    async fn list(provider: &dyn CatalogProvider) -> Result<Vec<Self>> {
        provider.get_saved_artists().await
    }

    async fn submit(provider: &dyn CatalogProvider, staged: &[Self]) -> Result<()> {
        provider.add_saved_artists(staged).await
    }
}

#[async_trait]
impl SavedEntity for Artist {
    async fn search(provider: &dyn CatalogProvider, query: &str) -> Result<Vec<Self>> {
        provider.search_artist(query).await
    }

    async fn fetch(provider: &dyn CatalogProvider, id: &str) -> Result<Option<Self>> {
        provider.get_artist(id).await
    }
}

#[async_trait]
impl ProviderEntity for Album {
    async fn list(provider: &dyn CatalogProvider) -> Result<Vec<Self>> {
        provider.get_saved_albums().await
    }

    async fn submit(provider: &dyn CatalogProvider, staged: &[Self]) -> Result<()> {
        provider.add_saved_albums(staged).await
    }
}

#[async_trait]
impl SavedEntity for Album {
    async fn search(provider: &dyn CatalogProvider, query: &str) -> Result<Vec<Self>> {
        provider.search_album(query).await
    }

    async fn fetch(provider: &dyn CatalogProvider, id: &str) -> Result<Option<Self>> {
        provider.get_album(id).await
    }
}

#[async_trait]
impl ProviderEntity for Track {
    async fn list(provider: &dyn CatalogProvider) -> Result<Vec<Self>> {
        provider.get_saved_tracks().await
    }

    async fn submit(provider: &dyn CatalogProvider, staged: &[Self]) -> Result<()> {
        provider.add_saved_tracks(staged).await
    }
}

#[async_trait]
impl SavedEntity for Track {
    async fn search(provider: &dyn CatalogProvider, query: &str) -> Result<Vec<Self>> {
        provider.search_track(query).await
    }

    async fn fetch(provider: &dyn CatalogProvider, id: &str) -> Result<Option<Self>> {
        provider.get_track(id).await
    }
}

#[async_trait]
impl ProviderEntity for Playlist {
    async fn list(provider: &dyn CatalogProvider) -> Result<Vec<Self>> {
        provider.get_playlists().await
    }

    async fn submit(provider: &dyn CatalogProvider, staged: &[Self]) -> Result<()> {
        for playlist in staged {
            provider.add_playlist(playlist).await?;
        }
        Ok(())
    }
}
