//! Local catalog connector
//!
//! Serves a [`CatalogExport`] through the [`CatalogProvider`] contract.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::prompt::InteractivePrompt;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_catalog::{
    simplified_name, Album, Artist, CatalogEntity, CatalogProvider, Playlist, Track,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{LocalCatalogError, Result};
use crate::types::{AlbumEntry, ArtistEntry, CatalogExport, LibraryEntry, PlaylistEntry, TrackEntry};

/// Maximum number of results returned by a search.
pub const SEARCH_LIMIT: usize = 10;

/// Local catalog provider
///
/// Answers listings, searches and lookups from an in-memory export. When
/// opened from a file, every successful submission is written back before the
/// call returns; a failed write leaves the in-memory catalog untouched.
///
/// # Features
///
/// - Case-insensitive token search over the whole catalog, at most
///   [`SEARCH_LIMIT`] results
/// - Saved library in insertion order
/// - Playlists matched by ID, then by name, on submission
///
/// # Example
///
/// ```ignore
/// use provider_local::LocalCatalogProvider;
/// use std::sync::Arc;
///
/// let provider = LocalCatalogProvider::connect("Vinyl", fs, prompt, None).await?;
/// let tracks = provider.get_saved_tracks().await?;
/// ```
pub struct LocalCatalogProvider {
    name: String,
    export: RwLock<CatalogExport>,
    location: Option<ExportLocation>,
}

struct ExportLocation {
    fs: Arc<dyn FileSystemAccess>,
    path: PathBuf,
}

impl LocalCatalogProvider {
    /// Create an in-memory provider. Submissions are not persisted.
    pub fn new(name: impl Into<String>, export: CatalogExport) -> Self {
        Self {
            name: name.into(),
            export: RwLock::new(export),
            location: None,
        }
    }

    /// Create an in-memory provider from the JSON text of an export.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let export: CatalogExport = serde_json::from_str(json)?;
        Ok(Self::new(name, export))
    }

    /// Open the export at `path`. A missing file yields an empty catalog that
    /// is created on the first submission.
    #[instrument(skip(name, fs), fields(path = %path.display()))]
    pub async fn open(
        name: impl Into<String>,
        fs: Arc<dyn FileSystemAccess>,
        path: PathBuf,
    ) -> Result<Self> {
        let export = if fs.exists(&path).await? {
            let data = fs.read_file(&path).await?;
            serde_json::from_slice(&data)?
        } else {
            info!("Catalog export does not exist yet, starting empty");
            CatalogExport::default()
        };

        Ok(Self {
            name: name.into(),
            export: RwLock::new(export),
            location: Some(ExportLocation { fs, path }),
        })
    }

    /// Open the export at `path`, asking the user for the location when none
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns [`LocalCatalogError::LocationMissing`] if the user cancels or
    /// leaves the answer empty.
    pub async fn connect(
        name: impl Into<String>,
        fs: Arc<dyn FileSystemAccess>,
        prompt: Arc<dyn InteractivePrompt>,
        path: Option<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        let path = match path {
            Some(path) => path,
            None => {
                let answer = prompt
                    .prompt_text(
                        &format!("Connect to {}", name),
                        &format!("Location of the {} catalog export:", name),
                        "(Path to a .json export)",
                    )
                    .await?;
                match answer.as_deref().map(str::trim) {
                    Some(path) if !path.is_empty() => PathBuf::from(path),
                    _ => return Err(LocalCatalogError::LocationMissing(name)),
                }
            }
        };

        Self::open(name, fs, path).await
    }

    /// Location of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.location.as_ref().map(|location| location.path.as_path())
    }

    /// Copy of the current export.
    pub async fn export(&self) -> CatalogExport {
        self.export.read().await.clone()
    }

    /// Serialize the current export as pretty-printed JSON.
    pub async fn to_json(&self) -> Result<String> {
        let export = self.export.read().await;
        Ok(serde_json::to_string_pretty(&*export)?)
    }

    async fn persist(&self, export: &CatalogExport) -> Result<()> {
        let Some(location) = &self.location else {
            return Ok(());
        };

        let data = serde_json::to_vec_pretty(export)?;
        location
            .fs
            .write_file(&location.path, Bytes::from(data))
            .await?;
        debug!(path = %location.path.display(), "Catalog export written");
        Ok(())
    }

    async fn saved<D: CatalogEntry>(&self) -> Vec<D::Entity> {
        let export = self.export.read().await;
        D::saved_ids(&export.library)
            .iter()
            .filter_map(|id| match D::entries(&export).iter().find(|e| e.id() == id.as_str()) {
                Some(entry) => decode(entry),
                None => {
                    warn!(kind = %<D::Entity as CatalogEntity>::KIND, id = %id, "Saved item missing from catalog");
                    None
                }
            })
            .collect()
    }

    async fn search<D: CatalogEntry>(&self, query: &str) -> Vec<D::Entity> {
        let terms: Vec<String> = simplified_name(query)
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let export = self.export.read().await;
        let results: Vec<D::Entity> = D::entries(&export)
            .iter()
            .filter_map(decode)
            .filter(|entity| {
                let key = entity.match_key();
                terms.iter().all(|term| key.contains(term.as_str()))
            })
            .take(SEARCH_LIMIT)
            .collect();
        debug!(results = results.len(), "Search finished");
        results
    }

    async fn get<D: CatalogEntry>(&self, id: &str) -> Result<Option<D::Entity>> {
        let export = self.export.read().await;
        D::entries(&export)
            .iter()
            .find(|entry| entry.id() == id)
            .map(D::to_entity)
            .transpose()
    }

    async fn add_saved<D: CatalogEntry>(&self, entities: &[D::Entity]) -> Result<()> {
        let mut export = self.export.write().await;
        let mut updated = export.clone();
        for entity in entities {
            let id = entity.id().to_string();
            if !D::entries(&updated).iter().any(|entry| entry.id() == id) {
                D::entries_mut(&mut updated).push(D::from_entity(entity));
            }
            let saved = D::saved_ids_mut(&mut updated.library);
            if !saved.contains(&id) {
                saved.push(id);
            }
        }

        self.persist(&updated).await?;
        *export = updated;
        info!(kind = %<D::Entity as CatalogEntity>::KIND, count = entities.len(), "Saved items added");
        Ok(())
    }

    async fn playlists(&self) -> Vec<Playlist> {
        let export = self.export.read().await;
        export
            .playlists
            .iter()
            .filter_map(|entry| {
                let tracks = entry
                    .track_ids
                    .iter()
                    .filter_map(|id| match export.tracks.iter().find(|t| &t.id == id) {
                        Some(track) => decode(track),
                        None => {
                            warn!(playlist = %entry.name, id = %id, "Playlist track missing from catalog");
                            None
                        }
                    })
                    .collect();
                match entry.to_playlist(tracks) {
                    Ok(playlist) => Some(playlist),
                    Err(e) => {
                        warn!(error = %e, "Skipping invalid playlist");
                        None
                    }
                }
            })
            .collect()
    }

    async fn store_playlist(&self, playlist: &Playlist) -> Result<String> {
        let mut export = self.export.write().await;
        let mut updated = export.clone();

        for track in playlist.tracks() {
            if !updated.tracks.iter().any(|t| t.id == track.id()) {
                updated.tracks.push(TrackEntry::from(track));
            }
        }
        let track_ids: Vec<String> = playlist.tracks().iter().map(|t| t.id().to_string()).collect();

        let key = playlist.match_key();
        let existing = updated
            .playlists
            .iter()
            .position(|p| !playlist.id().is_empty() && p.id == playlist.id())
            .or_else(|| {
                updated
                    .playlists
                    .iter()
                    .position(|p| simplified_name(&p.name).to_lowercase() == key)
            });

        let id = match existing {
            Some(index) => {
                let entry = &mut updated.playlists[index];
                entry.description = playlist.description().to_string();
                entry.public = playlist.is_public();
                if !playlist.image_url().is_empty() {
                    entry.image_url = playlist.image_url().to_string();
                }
                entry.track_ids = track_ids;
                debug!(id = %entry.id, "Updating existing playlist");
                entry.id.clone()
            }
            None => {
                let id = Uuid::new_v4().to_string();
                debug!(id = %id, "Creating playlist");
                updated.playlists.push(PlaylistEntry {
                    id: id.clone(),
                    name: playlist.name().to_string(),
                    description: playlist.description().to_string(),
                    public: playlist.is_public(),
                    image_url: playlist.image_url().to_string(),
                    track_ids,
                });
                id
            }
        };

        self.persist(&updated).await?;
        *export = updated;
        Ok(id)
    }
}

fn decode<D: CatalogEntry>(entry: &D) -> Option<D::Entity> {
    match entry.to_entity() {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(error = %e, "Skipping invalid catalog entry");
            None
        }
    }
}

// =============================================================================
// Export Sections
// =============================================================================

/// Ties an export entry type to its domain entity and its export sections.
trait CatalogEntry: Clone + Send + Sync + Sized {
    type Entity: CatalogEntity;

    fn id(&self) -> &str;
    fn to_entity(&self) -> Result<Self::Entity>;
    fn from_entity(entity: &Self::Entity) -> Self;
    fn entries(export: &CatalogExport) -> &Vec<Self>;
    fn entries_mut(export: &mut CatalogExport) -> &mut Vec<Self>;
    fn saved_ids(library: &LibraryEntry) -> &Vec<String>;
    fn saved_ids_mut(library: &mut LibraryEntry) -> &mut Vec<String>;
}

macro_rules! catalog_entry {
    ($entry:ty, $entity:ty, $section:ident) => {
        impl CatalogEntry for $entry {
            type Entity = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn to_entity(&self) -> Result<Self::Entity> {
                <$entity>::try_from(self)
            }

            fn from_entity(entity: &Self::Entity) -> Self {
                Self::from(entity)
            }

            fn entries(export: &CatalogExport) -> &Vec<Self> {
                &export.$section
            }

            fn entries_mut(export: &mut CatalogExport) -> &mut Vec<Self> {
                &mut export.$section
            }

            fn saved_ids(library: &LibraryEntry) -> &Vec<String> {
                &library.$section
            }

            fn saved_ids_mut(library: &mut LibraryEntry) -> &mut Vec<String> {
                &mut library.$section
            }
        }
    };
}

catalog_entry!(ArtistEntry, Artist, artists);
catalog_entry!(AlbumEntry, Album, albums);
catalog_entry!(TrackEntry, Track, tracks);

// =============================================================================
// CatalogProvider
// =============================================================================

#[async_trait]
impl CatalogProvider for LocalCatalogProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_saved_artists(&self) -> BridgeResult<Vec<Artist>> {
        Ok(self.saved::<ArtistEntry>().await)
    }

    async fn get_saved_albums(&self) -> BridgeResult<Vec<Album>> {
        Ok(self.saved::<AlbumEntry>().await)
    }

    async fn get_saved_tracks(&self) -> BridgeResult<Vec<Track>> {
        Ok(self.saved::<TrackEntry>().await)
    }

    async fn get_playlists(&self) -> BridgeResult<Vec<Playlist>> {
        Ok(self.playlists().await)
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn search_artist(&self, query: &str) -> BridgeResult<Vec<Artist>> {
        Ok(self.search::<ArtistEntry>(query).await)
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn search_album(&self, query: &str) -> BridgeResult<Vec<Album>> {
        Ok(self.search::<AlbumEntry>(query).await)
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn search_track(&self, query: &str) -> BridgeResult<Vec<Track>> {
        Ok(self.search::<TrackEntry>(query).await)
    }

    async fn get_artist(&self, id: &str) -> BridgeResult<Option<Artist>> {
        Ok(self.get::<ArtistEntry>(id).await?)
    }

    async fn get_album(&self, id: &str) -> BridgeResult<Option<Album>> {
        Ok(self.get::<AlbumEntry>(id).await?)
    }

    async fn get_track(&self, id: &str) -> BridgeResult<Option<Track>> {
        Ok(self.get::<TrackEntry>(id).await?)
    }

    #[instrument(skip_all, fields(provider = %self.name, count = artists.len()))]
    async fn add_saved_artists(&self, artists: &[Artist]) -> BridgeResult<()> {
        Ok(self.add_saved::<ArtistEntry>(artists).await?)
    }

    #[instrument(skip_all, fields(provider = %self.name, count = albums.len()))]
    async fn add_saved_albums(&self, albums: &[Album]) -> BridgeResult<()> {
        Ok(self.add_saved::<AlbumEntry>(albums).await?)
    }

    #[instrument(skip_all, fields(provider = %self.name, count = tracks.len()))]
    async fn add_saved_tracks(&self, tracks: &[Track]) -> BridgeResult<()> {
        Ok(self.add_saved::<TrackEntry>(tracks).await?)
    }

    #[instrument(skip_all, fields(provider = %self.name, playlist = playlist.name()))]
    async fn add_playlist(&self, playlist: &Playlist) -> BridgeResult<String> {
        Ok(self.store_playlist(playlist).await?)
    }

    fn get_search_url(&self, query: &str) -> String {
        format!(
            "catalog://{}/search/{}",
            urlencoding::encode(&self.name),
            urlencoding::encode(query)
        )
    }
}
