//! Domain models for catalog entities
//!
//! Entities are provider-scoped: an `id` is only meaningful inside the catalog
//! it came from. Cross-provider identity is decided by [`CatalogEntity::match_key`]
//! alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, Result};

/// Characters removed when building a simplified name.
const STRIPPED_CHARS: &[char] = &['(', ')', '[', ']', '{', '}', '-', ':', ';', '.', ','];

/// Strip brackets and punctuation, then trim surrounding whitespace.
///
/// Interior whitespace is left untouched, so `"Foo - Bar"` becomes `"Foo  Bar"`.
/// Applying the function twice yields the same result as applying it once.
pub fn simplified_name(text: &str) -> String {
    text.chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

// =============================================================================
// Entity Kind
// =============================================================================

/// The four kinds of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Track,
    Playlist,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Artist,
        EntityKind::Album,
        EntityKind::Track,
        EntityKind::Playlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Track => "track",
            EntityKind::Playlist => "playlist",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "artist" => Ok(EntityKind::Artist),
            "album" => Ok(EntityKind::Album),
            "track" => Ok(EntityKind::Track),
            "playlist" => Ok(EntityKind::Playlist),
            other => Err(CatalogError::InvalidKind(other.to_string())),
        }
    }
}

// =============================================================================
// Entity Trait
// =============================================================================

/// Behaviour shared by every catalog entity.
pub trait CatalogEntity: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// The entity's own name, without artist or album qualifiers.
    fn name(&self) -> &str;

    /// Kind-specific composition shown to users and used for matching.
    fn display_name(&self) -> String;

    /// Display name with brackets and punctuation stripped.
    fn simplified_name(&self) -> String {
        simplified_name(&self.display_name())
    }

    /// Lower-cased simplified name. Equal keys mean the same real-world item.
    fn match_key(&self) -> String {
        self.simplified_name().to_lowercase()
    }

    /// Lower-cased fields, most significant first.
    fn sort_key(&self) -> Vec<String>;

    fn is_dirty(&self) -> bool;

    fn set_dirty(&mut self, dirty: bool);

    /// Number of tracks carried inside this entity (playlists only).
    fn nested_tracks(&self) -> usize {
        0
    }
}

fn required(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidInput {
            field: field.to_string(),
            message: format!("{} cannot be empty", field),
        });
    }
    Ok(trimmed.to_string())
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

// =============================================================================
// Domain Models
// =============================================================================

/// Artist saved in a user's library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    id: String,
    name: String,
    dirty: bool,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: required("id", id.into())?,
            name: required("name", name.into())?,
            dirty: false,
        })
    }
}

impl CatalogEntity for Artist {
    const KIND: EntityKind = EntityKind::Artist;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self) -> Vec<String> {
        vec![self.name.to_lowercase()]
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

/// Album saved in a user's library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    id: String,
    name: String,
    artist: String,
    dirty: bool,
}

impl Album {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: required("id", id.into())?,
            name: required("name", name.into())?,
            artist: trimmed(artist.into()),
            dirty: false,
        })
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }
}

impl CatalogEntity for Album {
    const KIND: EntityKind = EntityKind::Album;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }

    fn sort_key(&self) -> Vec<String> {
        vec![self.artist.to_lowercase(), self.name.to_lowercase()]
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

/// Music track, either saved in a library or part of a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    id: String,
    name: String,
    artist: String,
    album: String,
    dirty: bool,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: required("id", id.into())?,
            name: required("name", name.into())?,
            artist: trimmed(artist.into()),
            album: trimmed(album.into()),
            dirty: false,
        })
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }
}

impl CatalogEntity for Track {
    const KIND: EntityKind = EntityKind::Track;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        format!("{} - {} - {}", self.artist, self.album, self.name)
    }

    fn sort_key(&self) -> Vec<String> {
        vec![
            self.artist.to_lowercase(),
            self.album.to_lowercase(),
            self.name.to_lowercase(),
        ]
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

/// User playlist with its ordered tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    id: String,
    name: String,
    description: String,
    public: bool,
    image_url: String,
    tracks: Vec<Track>,
    dirty: bool,
}

impl Playlist {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        public: bool,
        image_url: impl Into<String>,
        tracks: Vec<Track>,
    ) -> Result<Self> {
        Ok(Self {
            id: required("id", id.into())?,
            name: required("name", name.into())?,
            description: trimmed(description.into()),
            public,
            image_url: trimmed(image_url.into()),
            tracks,
            dirty: false,
        })
    }

    /// Build a playlist that does not exist at any provider yet.
    ///
    /// The ID stays empty until the destination assigns one on submission.
    pub fn shell(
        name: impl Into<String>,
        description: impl Into<String>,
        public: bool,
    ) -> Result<Self> {
        Ok(Self {
            id: String::new(),
            name: required("name", name.into())?,
            description: trimmed(description.into()),
            public,
            image_url: String::new(),
            tracks: Vec::new(),
            dirty: false,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Iterate over the tracks in chunks of at most `size` (minimum 1).
    pub fn track_chunks(&self, size: usize) -> std::slice::Chunks<'_, Track> {
        self.tracks.chunks(size.max(1))
    }
}

impl CatalogEntity for Playlist {
    const KIND: EntityKind = EntityKind::Playlist;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn sort_key(&self) -> Vec<String> {
        vec![self.name.to_lowercase()]
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    fn nested_tracks(&self) -> usize {
        self.tracks.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
