//! # Catalog Module
//!
//! Domain model shared by every other core crate.
//!
//! ## Overview
//!
//! This module provides:
//! - Validated entity types (`Artist`, `Album`, `Track`, `Playlist`) with
//!   display names, simplified names and sort keys
//! - Per-provider snapshots with a consistent name index
//! - The `CatalogProvider` contract implemented by each streaming service
//! - The persistent cross-provider ID mapping store

pub mod error;
pub mod mapping;
pub mod models;
pub mod provider;
pub mod snapshot;

pub use error::{CatalogError, Result};
pub use mapping::{MappingStore, ProviderPair};
pub use models::{simplified_name, Album, Artist, CatalogEntity, EntityKind, Playlist, Track};
pub use provider::{CatalogProvider, ProviderEntity, SavedEntity};
pub use snapshot::{EntityStatus, Side, Snapshot, SnapshotPair};
