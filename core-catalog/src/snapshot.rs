//! In-memory catalog snapshots
//!
//! A [`Snapshot`] is the ordered collection of one entity kind as seen at one
//! provider, with a name index kept consistent on every mutation. Snapshots of
//! the same kind for both providers live in a [`SnapshotPair`]; the pair, not
//! the snapshot, knows which side is the sibling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{simplified_name, CatalogEntity};

/// Row status relative to the opposite provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    /// Staged for submission.
    Modified,
    /// An entity with the same match key exists on the other side.
    Matching,
    NotMatching,
}

/// Which of the two providers a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Ordered, searchable entity collection for one provider and one kind
#[derive(Debug, Clone)]
pub struct Snapshot<E> {
    provider: String,
    entities: Vec<E>,
    index: HashMap<String, usize>,
}

impl<E: CatalogEntity> Snapshot<E> {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Label of the provider this snapshot was loaded from.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.index.clear();
    }

    /// Append an entity.
    pub fn add(&mut self, entity: E) {
        self.entities.push(entity);
        self.rebuild_index();
    }

    /// Prepend an entity so it surfaces before previously loaded ones.
    pub fn insert(&mut self, entity: E) {
        self.entities.insert(0, entity);
        self.rebuild_index();
    }

    /// Replace the contents with `entities` in sort-key order.
    pub fn load(&mut self, mut entities: Vec<E>) {
        entities.sort_by_key(|e| e.sort_key());
        self.entities = entities;
        self.rebuild_index();
    }

    /// Case-insensitive exact lookup by simplified name.
    ///
    /// The argument is simplified and lower-cased before the lookup, so both a
    /// display name and an already simplified name are accepted.
    pub fn find(&self, name: &str) -> Option<&E> {
        self.position(name).map(|i| &self.entities[i])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut E> {
        let position = self.position(name)?;
        self.entities.get_mut(position)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Classify `entity` against `sibling`. Never cached.
    pub fn status_of(entity: &E, sibling: &Snapshot<E>) -> EntityStatus {
        if entity.is_dirty() {
            EntityStatus::Modified
        } else if sibling.index.contains_key(&entity.match_key()) {
            EntityStatus::Matching
        } else {
            EntityStatus::NotMatching
        }
    }

    /// Clones of every staged entity, in snapshot order.
    pub fn dirty_entities(&self) -> Vec<E> {
        self.entities.iter().filter(|e| e.is_dirty()).cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.entities.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&simplified_name(name).to_lowercase()).copied()
    }

    // First occurrence owns the key when match keys collide.
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, entity) in self.entities.iter().enumerate() {
            self.index.entry(entity.match_key()).or_insert(position);
        }
    }
}

/// The A and B snapshots of one entity kind
#[derive(Debug, Clone)]
pub struct SnapshotPair<E> {
    a: Snapshot<E>,
    b: Snapshot<E>,
}

impl<E: CatalogEntity> SnapshotPair<E> {
    pub fn new(provider_a: impl Into<String>, provider_b: impl Into<String>) -> Self {
        Self {
            a: Snapshot::new(provider_a),
            b: Snapshot::new(provider_b),
        }
    }

    pub fn get(&self, side: Side) -> &Snapshot<E> {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Snapshot<E> {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Borrow the `from` side immutably and its opposite mutably.
    pub fn split(&mut self, from: Side) -> (&Snapshot<E>, &mut Snapshot<E>) {
        match from {
            Side::A => (&self.a, &mut self.b),
            Side::B => (&self.b, &mut self.a),
        }
    }

    /// Status of row `index` on `side` against the opposite side.
    pub fn status(&self, side: Side, index: usize) -> Option<EntityStatus> {
        let entity = self.get(side).get(index)?;
        Some(Snapshot::status_of(entity, self.get(side.opposite())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Artist, Track};

    fn artist(id: &str, name: &str) -> Artist {
        Artist::new(id, name).unwrap()
    }

    #[test]
    fn test_add_insert_and_find() {
        let mut snapshot = Snapshot::new("A");
        snapshot.add(artist("1", "Foo"));
        snapshot.insert(artist("2", "Bar"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(0).unwrap().id(), "2");
        assert_eq!(snapshot.find("FOO").unwrap().id(), "1");
        assert_eq!(snapshot.find("bar").unwrap().id(), "2");
        assert!(snapshot.find("baz").is_none());
    }

    #[test]
    fn test_find_uses_simplified_names() {
        let mut snapshot = Snapshot::new("A");
        snapshot.add(Track::new("t1", "Baz (Live)", "Foo", "Bar").unwrap());

        assert!(snapshot.contains("foo - bar - baz (live)"));
        assert!(snapshot.contains("Foo  Bar  Baz Live"));
    }

    #[test]
    fn test_clear_empties_index() {
        let mut snapshot = Snapshot::new("A");
        snapshot.add(artist("1", "Foo"));
        snapshot.clear();

        assert!(snapshot.is_empty());
        assert!(snapshot.find("foo").is_none());
    }

    #[test]
    fn test_duplicate_names_first_seen_wins() {
        let mut snapshot = Snapshot::new("A");
        snapshot.add(artist("1", "Foo"));
        snapshot.add(artist("2", "foo"));
        assert_eq!(snapshot.find("foo").unwrap().id(), "1");

        // An inserted duplicate moves to the front and takes over the key.
        snapshot.insert(artist("3", "FOO"));
        assert_eq!(snapshot.find("foo").unwrap().id(), "3");
    }

    #[test]
    fn test_load_sorts_by_sort_key() {
        let mut snapshot = Snapshot::new("A");
        snapshot.add(artist("old", "Old"));
        snapshot.load(vec![artist("1", "zed"), artist("2", "Abba"), artist("3", "mia")]);

        let ids: Vec<&str> = snapshot.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert!(snapshot.find("old").is_none());
    }

    #[test]
    fn test_find_mut_and_dirty_entities() {
        let mut snapshot = Snapshot::new("A");
        snapshot.load(vec![artist("1", "Foo"), artist("2", "Bar")]);
        snapshot.find_mut("foo").unwrap().set_dirty(true);

        let dirty = snapshot.dirty_entities();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].id(), "1");
    }

    #[test]
    fn test_status_follows_sibling() {
        let mut pair = SnapshotPair::new("A", "B");
        pair.get_mut(Side::A).add(artist("a1", "Foo"));
        assert_eq!(pair.status(Side::A, 0), Some(EntityStatus::NotMatching));

        pair.get_mut(Side::B).add(artist("b1", "foo"));
        assert_eq!(pair.status(Side::A, 0), Some(EntityStatus::Matching));
        assert_eq!(pair.status(Side::B, 0), Some(EntityStatus::Matching));

        let (_, destination) = pair.split(Side::A);
        destination.find_mut("foo").unwrap().set_dirty(true);
        assert_eq!(pair.status(Side::B, 0), Some(EntityStatus::Modified));
        assert_eq!(pair.status(Side::B, 1), None);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
    }
}
