//! # Local Catalog Provider
//!
//! Implements `CatalogProvider` over a JSON catalog export on disk.
//!
//! ## Overview
//!
//! This module provides:
//! - Typed DTOs for the export format, decoded and validated at the boundary
//! - Saved-library listings for artists, albums, tracks and playlists
//! - Bounded, case-insensitive searches over the whole export
//! - Create-or-update playlist submission with generated IDs
//! - Write-through persistence via `FileSystemAccess`
//!
//! A provider is usually opened with [`LocalCatalogProvider::connect`], which
//! asks the injected `InteractivePrompt` for the export location when none is
//! configured.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{LocalCatalogProvider, SEARCH_LIMIT};
pub use error::{LocalCatalogError, Result};
pub use types::CatalogExport;
