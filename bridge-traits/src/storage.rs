//! Storage and File System Abstractions
//!
//! Provides a platform-agnostic trait for the small amount of file I/O the
//! core performs: persisting the identity mapping file and provider catalog
//! exports.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File system access trait
///
/// Abstracts file I/O operations so that the core never touches `std::fs`
/// directly:
/// - Desktop: Direct filesystem access (`bridge-desktop::TokioFileSystem`)
/// - Tests: In-memory maps
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn store_mappings(fs: &dyn FileSystemAccess, json: Vec<u8>) -> Result<()> {
///     let data_dir = fs.get_data_directory().await?;
///     fs.write_file(&data_dir.join("mappings.json"), json.into()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's data directory
    ///
    /// This directory is suitable for persistent application data.
    async fn get_data_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it if it doesn't exist
    ///
    /// The file is fully written and closed before this returns; a partially
    /// written file must never be observable on success.
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;
}
