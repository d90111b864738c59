//! # Core Configuration Module
//!
//! Provides configuration management for the catalog transfer core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges and settings the core needs. It
//! enforces fail-fast validation so that a missing bridge is reported at
//! startup, not in the middle of a transfer.
//!
//! ## Required Dependencies
//!
//! - `FileSystemAccess` - Persists the identity mapping file
//! - `InteractivePrompt` - Manual ID entry and submit confirmation
//!
//! When the `desktop-shims` feature is enabled, `TokioFileSystem` and
//! `ConsolePrompt` are injected automatically if not provided, and the mapping
//! file defaults to `mappings.json` in the platform data directory.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .mapping_path("/path/to/mappings.json")
//!     .file_system(Arc::new(MyFileSystem))
//!     .prompt(Arc::new(MyPrompt))
//!     .confirm_submit(true)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, InteractivePrompt};
use std::path::PathBuf;
use std::sync::Arc;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

const MAX_EVENT_BUFFER_SIZE: usize = 65_536;

/// Core configuration for the catalog transfer core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Location of the identity mapping file
    pub mapping_path: PathBuf,

    /// File system access abstraction
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Interactive collaborator for manual resolution
    pub prompt: Arc<dyn InteractivePrompt>,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    /// Transfer behaviour switches
    pub transfer: TransferSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("mapping_path", &self.mapping_path)
            .field("file_system", &"FileSystemAccess { ... }")
            .field("prompt", &"InteractivePrompt { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("transfer", &self.transfer)
            .finish()
    }
}

/// Switches controlling how a transfer resolves entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    /// Re-check entities restored from a stored mapping against the source
    /// name before accepting them. Off by default: stored mappings were
    /// confirmed once and are trusted.
    pub revalidate_mappings: bool,

    /// Ask for confirmation before submitting staged entities.
    pub confirm_submit: bool,

    /// Retry a track search without the album title when the first search
    /// returns nothing.
    pub fallback_track_search: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            revalidate_mappings: false,
            confirm_submit: false,
            fallback_track_search: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Mapping path is not empty and names a file
    /// - Event buffer size is within bounds
    pub fn validate(&self) -> Result<()> {
        if self.mapping_path.as_os_str().is_empty() {
            return Err(Error::Config("Mapping path cannot be empty".to_string()));
        }

        if self.mapping_path.file_name().is_none() {
            return Err(Error::Config(format!(
                "Mapping path must name a file, got {}",
                self.mapping_path.display()
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for mapping persistence. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 Other hosts: inject a platform file system adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn prompt_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "InteractivePrompt".to_string(),
        message: "InteractivePrompt implementation is required for manual resolution. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ConsolePrompt. \
                 GUI hosts: inject a dialog-backed prompt."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_prompt() -> Result<Arc<dyn InteractivePrompt>> {
    use bridge_desktop::ConsolePrompt;

    let prompt: Arc<dyn InteractivePrompt> = Arc::new(ConsolePrompt::new());
    Ok(prompt)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_prompt() -> Result<Arc<dyn InteractivePrompt>> {
    Err(prompt_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_mapping_path() -> Result<PathBuf> {
    Ok(bridge_desktop::default_data_dir().join("mappings.json"))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_mapping_path() -> Result<PathBuf> {
    Err(Error::Config(
        "Mapping path is required. Use .mapping_path() to set it.".to_string(),
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    mapping_path: Option<PathBuf>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    prompt: Option<Arc<dyn InteractivePrompt>>,
    event_buffer_size: Option<usize>,
    transfer: TransferSettings,
}

impl CoreConfigBuilder {
    /// Sets the identity mapping file location.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .mapping_path("/path/to/mappings.json");
    /// ```
    pub fn mapping_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.mapping_path = Some(path.into());
        self
    }

    /// Sets the file system access implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the interactive prompt implementation.
    pub fn prompt(mut self, prompt: Arc<dyn InteractivePrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 256
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables re-validation of stored mappings.
    ///
    /// Default: false
    pub fn revalidate_mappings(mut self, enabled: bool) -> Self {
        self.transfer.revalidate_mappings = enabled;
        self
    }

    /// Enables or disables the confirmation prompt before submission.
    ///
    /// Default: false
    pub fn confirm_submit(mut self, enabled: bool) -> Self {
        self.transfer.confirm_submit = enabled;
        self
    }

    /// Enables or disables the album-less track search retry.
    ///
    /// Default: true
    pub fn fallback_track_search(mut self, enabled: bool) -> Self {
        self.transfer.fallback_track_search = enabled;
        self
    }

    /// Sets all transfer switches at once.
    pub fn transfer_settings(mut self, settings: TransferSettings) -> Self {
        self.transfer = settings;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if a required bridge is missing and no desktop default
    /// is available, or if a value is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let mapping_path = match self.mapping_path {
            Some(path) => path,
            None => provide_default_mapping_path()?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let prompt = match self.prompt {
            Some(prompt) => prompt,
            None => provide_default_prompt()?,
        };

        let config = CoreConfig {
            mapping_path,
            file_system,
            prompt,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            transfer: self.transfer,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, PromptChoice};
    use bytes::Bytes;
    use std::path::Path;

    struct MockFileSystem;

    #[async_trait]
    impl FileSystemAccess for MockFileSystem {
        async fn get_data_directory(&self) -> std::result::Result<PathBuf, BridgeError> {
            Ok(PathBuf::from("/data"))
        }

        async fn exists(&self, _path: &Path) -> std::result::Result<bool, BridgeError> {
            Ok(false)
        }

        async fn create_dir_all(&self, _path: &Path) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn read_file(&self, _path: &Path) -> std::result::Result<Bytes, BridgeError> {
            Err(BridgeError::NotAvailable("read_file".to_string()))
        }

        async fn write_file(
            &self,
            _path: &Path,
            _data: Bytes,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn delete_file(&self, _path: &Path) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    struct MockPrompt;

    #[async_trait]
    impl InteractivePrompt for MockPrompt {
        async fn prompt_choice(
            &self,
            _title: &str,
            _message: &str,
        ) -> std::result::Result<PromptChoice, BridgeError> {
            Ok(PromptChoice::Cancelled)
        }

        async fn prompt_text(
            &self,
            _title: &str,
            _message: &str,
            _hint: &str,
        ) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .mapping_path("/data/mappings.json")
            .file_system(Arc::new(MockFileSystem))
            .prompt(Arc::new(MockPrompt))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.mapping_path, PathBuf::from("/data/mappings.json"));
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.transfer, TransferSettings::default());
    }

    #[test]
    fn test_transfer_settings_default() {
        let settings = TransferSettings::default();
        assert!(!settings.revalidate_mappings);
        assert!(!settings.confirm_submit);
        assert!(settings.fallback_track_search);
    }

    #[test]
    fn test_builder_with_transfer_switches() {
        let config = complete_builder()
            .revalidate_mappings(true)
            .confirm_submit(true)
            .fallback_track_search(false)
            .build()
            .unwrap();

        assert!(config.transfer.revalidate_mappings);
        assert!(config.transfer.confirm_submit);
        assert!(!config.transfer.fallback_track_search);
    }

    #[test]
    fn test_validate_rejects_empty_mapping_path() {
        let result = complete_builder().mapping_path("").build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Mapping path cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_directory_like_mapping_path() {
        let result = complete_builder().mapping_path("/").build();
        assert!(result.unwrap_err().to_string().contains("must name a file"));
    }

    #[test]
    fn test_validate_rejects_zero_event_buffer() {
        let result = complete_builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_excessive_event_buffer() {
        let result = complete_builder().event_buffer_size(1_000_000).build();
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = complete_builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("FileSystemAccess { ... }"));
        assert!(debug.contains("mappings.json"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_file_system() {
        let result = CoreConfig::builder()
            .mapping_path("/data/mappings.json")
            .prompt(Arc::new(MockPrompt))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("FileSystemAccess"));
        assert!(err_msg.contains("mapping persistence"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_prompt() {
        let result = CoreConfig::builder()
            .mapping_path("/data/mappings.json")
            .file_system(Arc::new(MockFileSystem))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("InteractivePrompt"));
        assert!(err_msg.contains("manual resolution"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_mapping_path() {
        let result = CoreConfig::builder()
            .file_system(Arc::new(MockFileSystem))
            .prompt(Arc::new(MockPrompt))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Mapping path is required"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = CoreConfig::builder().build().unwrap();

        assert!(config.mapping_path.ends_with("mappings.json"));
    }
}
