//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs` with atomic replace-on-write
//! - `InteractivePrompt` over stdin/stdout
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ConsolePrompt, TokioFileSystem};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .file_system(Arc::new(TokioFileSystem::new()))
//!     .prompt(Arc::new(ConsolePrompt::new()))
//!     .build()?;
//! ```

mod filesystem;
mod prompt;

pub use filesystem::{default_data_dir, TokioFileSystem};
pub use prompt::ConsolePrompt;
