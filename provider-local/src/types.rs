//! Catalog export file format
//!
//! Data structures for (de)serializing a catalog export. The export holds the
//! full searchable catalog plus a `library` section naming, by ID, the items
//! the user has saved. Playlists reference their tracks by ID.
//!
//! ```json
//! {
//!   "artists": [{ "id": "ar1", "name": "Foo" }],
//!   "albums": [{ "id": "al1", "name": "Bar", "artist": "Foo" }],
//!   "tracks": [{ "id": "t1", "name": "Baz", "artist": "Foo", "album": "Bar" }],
//!   "playlists": [{ "id": "p1", "name": "Mix", "public": true, "trackIds": ["t1"] }],
//!   "library": { "artists": ["ar1"], "albums": [], "tracks": ["t1"] }
//! }
//! ```

use core_catalog::{Album, Artist, CatalogEntity, CatalogError, Playlist, Track};
use serde::{Deserialize, Serialize};

use crate::error::LocalCatalogError;

/// Root of a catalog export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExport {
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,

    #[serde(default)]
    pub albums: Vec<AlbumEntry>,

    #[serde(default)]
    pub tracks: Vec<TrackEntry>,

    #[serde(default)]
    pub playlists: Vec<PlaylistEntry>,

    /// IDs of saved items, in the order they were saved
    #[serde(default)]
    pub library: LibraryEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumEntry {
    pub id: String,
    pub name: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEntry {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_public")]
    pub public: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,

    /// Ordered track IDs; each must exist in [`CatalogExport::tracks`]
    #[serde(default)]
    pub track_ids: Vec<String>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    #[serde(default)]
    pub artists: Vec<String>,

    #[serde(default)]
    pub albums: Vec<String>,

    #[serde(default)]
    pub tracks: Vec<String>,
}

// =============================================================================
// Domain Conversion
// =============================================================================

fn invalid(kind: &str, id: &str, error: CatalogError) -> LocalCatalogError {
    LocalCatalogError::InvalidEntry {
        kind: kind.to_string(),
        id: id.to_string(),
        message: error.to_string(),
    }
}

impl TryFrom<&ArtistEntry> for Artist {
    type Error = LocalCatalogError;

    fn try_from(entry: &ArtistEntry) -> Result<Self, Self::Error> {
        Artist::new(entry.id.as_str(), entry.name.as_str()).map_err(|e| invalid("artist", &entry.id, e))
    }
}

impl TryFrom<&AlbumEntry> for Album {
    type Error = LocalCatalogError;

    fn try_from(entry: &AlbumEntry) -> Result<Self, Self::Error> {
        Album::new(entry.id.as_str(), entry.name.as_str(), entry.artist.as_str())
            .map_err(|e| invalid("album", &entry.id, e))
    }
}

impl TryFrom<&TrackEntry> for Track {
    type Error = LocalCatalogError;

    fn try_from(entry: &TrackEntry) -> Result<Self, Self::Error> {
        Track::new(
            entry.id.as_str(),
            entry.name.as_str(),
            entry.artist.as_str(),
            entry.album.as_str(),
        )
        .map_err(|e| invalid("track", &entry.id, e))
    }
}

impl PlaylistEntry {
    /// Build the domain playlist from already-resolved tracks.
    pub fn to_playlist(&self, tracks: Vec<Track>) -> Result<Playlist, LocalCatalogError> {
        Playlist::new(
            self.id.as_str(),
            self.name.as_str(),
            self.description.as_str(),
            self.public,
            self.image_url.as_str(),
            tracks,
        )
        .map_err(|e| invalid("playlist", &self.id, e))
    }
}

impl From<&Artist> for ArtistEntry {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id().to_string(),
            name: artist.name().to_string(),
        }
    }
}

impl From<&Album> for AlbumEntry {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id().to_string(),
            name: album.name().to_string(),
            artist: album.artist().to_string(),
        }
    }
}

impl From<&Track> for TrackEntry {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id().to_string(),
            name: track.name().to_string(),
            artist: track.artist().to_string(),
            album: track.album().to_string(),
        }
    }
}
