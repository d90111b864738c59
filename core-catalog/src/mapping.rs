//! Identity mapping store
//!
//! Remembers confirmed ID correspondences between two providers so a later
//! transfer can skip searching. Tables are keyed by entity kind and by the
//! `"source:destination"` provider pair; every forward entry has a reverse
//! twin under the swapped pair. Entries are overwritten, never removed.
//!
//! # File format
//!
//! ```json
//! {
//!   "artist": { "Spotify:Tidal": { "sourceId": "destId" } },
//!   "album":  { },
//!   "track":  { }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use bridge_traits::storage::FileSystemAccess;

use crate::error::{CatalogError, Result};
use crate::models::EntityKind;

type PairTables = BTreeMap<String, BTreeMap<String, String>>;

/// Ordered pair of provider names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderPair {
    pub source: String,
    pub destination: String,
}

impl ProviderPair {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// `"source:destination"`
    pub fn key(&self) -> String {
        format!("{}:{}", self.source, self.destination)
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MappingTables {
    #[serde(default)]
    artist: PairTables,
    #[serde(default)]
    album: PairTables,
    #[serde(default)]
    track: PairTables,
}

impl MappingTables {
    fn for_kind(&self, kind: EntityKind) -> Result<&PairTables> {
        match kind {
            EntityKind::Artist => Ok(&self.artist),
            EntityKind::Album => Ok(&self.album),
            EntityKind::Track => Ok(&self.track),
            EntityKind::Playlist => Err(CatalogError::InvalidKind(kind.to_string())),
        }
    }

    fn for_kind_mut(&mut self, kind: EntityKind) -> Result<&mut PairTables> {
        match kind {
            EntityKind::Artist => Ok(&mut self.artist),
            EntityKind::Album => Ok(&mut self.album),
            EntityKind::Track => Ok(&mut self.track),
            EntityKind::Playlist => Err(CatalogError::InvalidKind(kind.to_string())),
        }
    }
}

/// Persistent, bidirectional ID mapping cache
///
/// Playlists are never mapped; every operation rejects
/// [`EntityKind::Playlist`] with [`CatalogError::InvalidKind`].
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    tables: MappingTables,
    modified: bool,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `source_id -> destination_id` under `pair`, and the reverse
    /// under `pair.reversed()`. Last write wins.
    pub fn add(
        &mut self,
        kind: EntityKind,
        pair: &ProviderPair,
        source_id: &str,
        destination_id: &str,
    ) -> Result<()> {
        let tables = self.tables.for_kind_mut(kind)?;
        tables
            .entry(pair.key())
            .or_default()
            .insert(source_id.to_string(), destination_id.to_string());
        tables
            .entry(pair.reversed().key())
            .or_default()
            .insert(destination_id.to_string(), source_id.to_string());
        self.modified = true;

        debug!(
            kind = %kind,
            pair = %pair.key(),
            source_id,
            destination_id,
            "Recorded mapping"
        );
        Ok(())
    }

    /// Destination ID previously recorded for `source_id`, if any.
    pub fn find(&self, kind: EntityKind, pair: &ProviderPair, source_id: &str) -> Result<Option<String>> {
        Ok(self
            .tables
            .for_kind(kind)?
            .get(&pair.key())
            .and_then(|table| table.get(source_id))
            .cloned())
    }

    /// Source ID previously recorded for `destination_id`, if any.
    pub fn find_reverse(
        &self,
        kind: EntityKind,
        pair: &ProviderPair,
        destination_id: &str,
    ) -> Result<Option<String>> {
        self.find(kind, &pair.reversed(), destination_id)
    }

    /// Number of forward entries stored for `kind` under `pair`.
    pub fn len(&self, kind: EntityKind, pair: &ProviderPair) -> Result<usize> {
        Ok(self
            .tables
            .for_kind(kind)?
            .get(&pair.key())
            .map_or(0, |table| table.len()))
    }

    /// Whether entries were added since the last load or save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Load the store from `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty store; the
    /// problem is logged and never returned.
    pub async fn load(fs: &dyn FileSystemAccess, path: &Path) -> Self {
        match fs.exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                info!(path = %path.display(), "No mapping file yet, starting empty");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot check mapping file, starting empty");
                return Self::default();
            }
        }

        let data = match fs.read_file(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read mapping file, starting empty");
                return Self::default();
            }
        };

        match serde_json::from_slice::<MappingTables>(&data) {
            Ok(tables) => {
                info!(
                    path = %path.display(),
                    artist_pairs = tables.artist.len(),
                    album_pairs = tables.album.len(),
                    track_pairs = tables.track.len(),
                    "Loaded mapping file"
                );
                Self {
                    tables,
                    modified: false,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed mapping file, starting empty");
                Self::default()
            }
        }
    }

    /// Write the store to `path`, creating parent directories as needed.
    pub async fn save(&mut self, fs: &dyn FileSystemAccess, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.tables)
            .map_err(|e| CatalogError::Persistence(format!("Failed to encode mappings: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs.create_dir_all(parent).await.map_err(|e| {
                CatalogError::Persistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        fs.write_file(path, json.into()).await.map_err(|e| {
            CatalogError::Persistence(format!("Failed to write {}: {}", path.display(), e))
        })?;

        self.modified = false;
        info!(path = %path.display(), "Saved mapping file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> ProviderPair {
        ProviderPair::new("Spotify", "Tidal")
    }

    #[test]
    fn test_pair_key() {
        assert_eq!(pair().key(), "Spotify:Tidal");
        assert_eq!(pair().reversed().key(), "Tidal:Spotify");
    }

    #[test]
    fn test_add_is_symmetric() {
        let mut store = MappingStore::new();
        store.add(EntityKind::Track, &pair(), "sp1", "td1").unwrap();

        assert_eq!(store.find(EntityKind::Track, &pair(), "sp1").unwrap(), Some("td1".to_string()));
        assert_eq!(
            store.find_reverse(EntityKind::Track, &pair(), "td1").unwrap(),
            Some("sp1".to_string())
        );
        assert_eq!(
            store.find(EntityKind::Track, &pair().reversed(), "td1").unwrap(),
            Some("sp1".to_string())
        );
        assert!(store.is_modified());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = MappingStore::new();
        store.add(EntityKind::Album, &pair(), "sp1", "td1").unwrap();
        store.add(EntityKind::Album, &pair(), "sp1", "td2").unwrap();

        assert_eq!(store.find(EntityKind::Album, &pair(), "sp1").unwrap(), Some("td2".to_string()));
        assert_eq!(store.len(EntityKind::Album, &pair()).unwrap(), 1);
    }

    #[test]
    fn test_kinds_are_isolated() {
        let mut store = MappingStore::new();
        store.add(EntityKind::Artist, &pair(), "x", "y").unwrap();

        assert_eq!(store.find(EntityKind::Album, &pair(), "x").unwrap(), None);
        assert_eq!(store.find(EntityKind::Artist, &ProviderPair::new("Spotify", "Deezer"), "x").unwrap(), None);
    }

    #[test]
    fn test_playlist_kind_rejected() {
        let mut store = MappingStore::new();
        assert!(matches!(
            store.add(EntityKind::Playlist, &pair(), "a", "b"),
            Err(CatalogError::InvalidKind(_))
        ));
        assert!(matches!(
            store.find(EntityKind::Playlist, &pair(), "a"),
            Err(CatalogError::InvalidKind(_))
        ));
        assert!(!store.is_modified());
    }

    #[test]
    fn test_file_format() {
        let mut store = MappingStore::new();
        store.add(EntityKind::Artist, &pair(), "a", "b").unwrap();

        let value = serde_json::to_value(&store.tables).unwrap();
        assert_eq!(value["artist"]["Spotify:Tidal"]["a"], "b");
        assert_eq!(value["artist"]["Tidal:Spotify"]["b"], "a");
        assert!(value["album"].as_object().unwrap().is_empty());
        assert!(value["track"].as_object().unwrap().is_empty());
    }
}
