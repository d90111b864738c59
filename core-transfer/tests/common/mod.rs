//! Test doubles shared by the transfer integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::prompt::{InteractivePrompt, PromptChoice};
use core_catalog::{
    Album, Artist, CatalogEntity, CatalogProvider, Playlist, ProviderPair, Snapshot, Track,
};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// Mock Implementations
// ============================================================================

mock! {
    pub Prompt {}

    #[async_trait]
    impl InteractivePrompt for Prompt {
        async fn prompt_choice(&self, title: &str, message: &str) -> BridgeResult<PromptChoice>;
        async fn prompt_text(
            &self,
            title: &str,
            message: &str,
            hint: &str,
        ) -> BridgeResult<Option<String>>;
    }
}

/// A prompt that must never be asked anything.
pub fn silent_prompt() -> MockPrompt {
    let mut prompt = MockPrompt::new();
    prompt.expect_prompt_text().never();
    prompt.expect_prompt_choice().never();
    prompt
}

/// In-memory provider that records every call it receives.
///
/// `saved_tracks` and `playlists` are the user's library; `catalog` is what
/// `get_track` can see; `search_results` answers `search_track` by exact query.
#[derive(Default)]
pub struct RecordingProvider {
    name: String,
    saved_tracks: Mutex<Vec<Track>>,
    playlists: Mutex<Vec<Playlist>>,
    catalog: Vec<Track>,
    search_results: HashMap<String, Vec<Track>>,
    fail_submit: bool,
    calls: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_saved_tracks(self, tracks: Vec<Track>) -> Self {
        *self.saved_tracks.lock().unwrap() = tracks;
        self
    }

    pub fn with_playlists(self, playlists: Vec<Playlist>) -> Self {
        *self.playlists.lock().unwrap() = playlists;
        self
    }

    pub fn with_catalog(mut self, tracks: Vec<Track>) -> Self {
        self.catalog = tracks;
        self
    }

    pub fn with_search(mut self, query: &str, results: Vec<Track>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn saved_playlists(&self) -> Vec<Playlist> {
        self.playlists.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogProvider for RecordingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_saved_artists(&self) -> BridgeResult<Vec<Artist>> {
        self.log("get_saved_artists".to_string());
        Ok(Vec::new())
    }

    async fn get_saved_albums(&self) -> BridgeResult<Vec<Album>> {
        self.log("get_saved_albums".to_string());
        Ok(Vec::new())
    }

    async fn get_saved_tracks(&self) -> BridgeResult<Vec<Track>> {
        self.log("get_saved_tracks".to_string());
        Ok(self.saved_tracks.lock().unwrap().clone())
    }

    async fn get_playlists(&self) -> BridgeResult<Vec<Playlist>> {
        self.log("get_playlists".to_string());
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn search_artist(&self, query: &str) -> BridgeResult<Vec<Artist>> {
        self.log(format!("search_artist:{}", query));
        Ok(Vec::new())
    }

    async fn search_album(&self, query: &str) -> BridgeResult<Vec<Album>> {
        self.log(format!("search_album:{}", query));
        Ok(Vec::new())
    }

    async fn search_track(&self, query: &str) -> BridgeResult<Vec<Track>> {
        self.log(format!("search_track:{}", query));
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn get_artist(&self, id: &str) -> BridgeResult<Option<Artist>> {
        self.log(format!("get_artist:{}", id));
        Ok(None)
    }

    async fn get_album(&self, id: &str) -> BridgeResult<Option<Album>> {
        self.log(format!("get_album:{}", id));
        Ok(None)
    }

    async fn get_track(&self, id: &str) -> BridgeResult<Option<Track>> {
        self.log(format!("get_track:{}", id));
        Ok(self.catalog.iter().find(|t| t.id() == id).cloned())
    }

    async fn add_saved_artists(&self, artists: &[Artist]) -> BridgeResult<()> {
        self.log(format!("add_saved_artists:{}", artists.len()));
        Ok(())
    }

    async fn add_saved_albums(&self, albums: &[Album]) -> BridgeResult<()> {
        self.log(format!("add_saved_albums:{}", albums.len()));
        Ok(())
    }

    async fn add_saved_tracks(&self, tracks: &[Track]) -> BridgeResult<()> {
        self.log(format!("add_saved_tracks:{}", tracks.len()));
        if self.fail_submit {
            return Err(BridgeError::RequestFailed("503 Service Unavailable".to_string()));
        }
        let mut saved = self.saved_tracks.lock().unwrap();
        for track in tracks {
            let mut track = track.clone();
            track.set_dirty(false);
            saved.push(track);
        }
        Ok(())
    }

    async fn add_playlist(&self, playlist: &Playlist) -> BridgeResult<String> {
        self.log(format!("add_playlist:{}", playlist.name()));
        if self.fail_submit {
            return Err(BridgeError::RequestFailed("503 Service Unavailable".to_string()));
        }
        let mut playlists = self.playlists.lock().unwrap();
        let existing = playlists.iter().position(|p| {
            (!playlist.id().is_empty() && p.id() == playlist.id()) || p.name() == playlist.name()
        });
        let id = match existing {
            Some(index) => playlists.remove(index).id().to_string(),
            None => format!("pl-{}", playlists.len() + 1),
        };
        let stored = Playlist::new(
            id.clone(),
            playlist.name(),
            playlist.description(),
            playlist.is_public(),
            playlist.image_url(),
            playlist.tracks().to_vec(),
        )
        .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        playlists.push(stored);
        Ok(id)
    }

    fn get_search_url(&self, query: &str) -> String {
        format!("https://{}.example/search/{}", self.name.to_lowercase(), query)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn track(id: &str, name: &str, artist: &str, album: &str) -> Track {
    Track::new(id, name, artist, album).unwrap()
}

pub fn playlist(id: &str, name: &str, tracks: Vec<Track>) -> Playlist {
    Playlist::new(id, name, "", true, "", tracks).unwrap()
}

pub fn snapshot<E: CatalogEntity>(provider: &str, entities: Vec<E>) -> Snapshot<E> {
    let mut snapshot = Snapshot::new(provider);
    snapshot.load(entities);
    snapshot
}

pub fn pair() -> ProviderPair {
    ProviderPair::new("Spotify", "Tidal")
}
