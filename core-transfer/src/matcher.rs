//! Search queries and exact-match rules per entity kind
//!
//! A search candidate is accepted only when its name and every secondary
//! field (artist, album) equal the source entity's, ignoring case. Fuzzy
//! similarity is never used.

use core_catalog::{Album, Artist, CatalogEntity, SavedEntity, Track};

/// Saved-library entities the reconciliation engine can search for.
pub trait Matchable: SavedEntity {
    /// Queries to try in order. Later queries run only when the previous
    /// one returned nothing.
    fn search_queries(&self, fallback: bool) -> Vec<String>;

    /// Whether `candidate` is the same item as `self`.
    fn is_exact_match(&self, candidate: &Self) -> bool;
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Matchable for Artist {
    fn search_queries(&self, _fallback: bool) -> Vec<String> {
        vec![self.name().to_string()]
    }

    fn is_exact_match(&self, candidate: &Self) -> bool {
        same_text(self.name(), candidate.name())
    }
}

impl Matchable for Album {
    fn search_queries(&self, _fallback: bool) -> Vec<String> {
        vec![format!("{} - {}", self.artist(), self.name())]
    }

    fn is_exact_match(&self, candidate: &Self) -> bool {
        same_text(self.name(), candidate.name()) && same_text(self.artist(), candidate.artist())
    }
}

impl Matchable for Track {
    fn search_queries(&self, fallback: bool) -> Vec<String> {
        let mut queries = vec![format!(
            "{} - {} - {}",
            self.artist(),
            self.album(),
            self.name()
        )];
        if fallback {
            queries.push(format!("{} - {}", self.artist(), self.name()));
        }
        queries
    }

    fn is_exact_match(&self, candidate: &Self) -> bool {
        same_text(self.name(), candidate.name())
            && same_text(self.artist(), candidate.artist())
            && same_text(self.album(), candidate.album())
    }
}
