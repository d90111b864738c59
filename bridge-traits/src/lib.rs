//! # Host Bridge Traits
//!
//! Contracts between the transfer core and the host it runs in.
//!
//! ## Overview
//!
//! The core never opens files, reads stdin or writes to a terminal on its own.
//! Each capability it needs is expressed here as a trait, and the host injects
//! an implementation at startup (see `bridge-desktop` for the desktop one).
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Persisting the identity mapping file
//! - [`InteractivePrompt`](prompt::InteractivePrompt) - Confirmation dialogs and manual ID entry
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! let prompt = config.prompt
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "InteractivePrompt".to_string(),
//!         message: "No prompt implementation provided. \
//!                  Desktop: enable the `desktop-shims` feature.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits and catalog providers report failures with
//! [`BridgeError`](error::BridgeError). Implementations should convert
//! platform-specific errors and include context (file paths, request names).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across async
//! tasks behind an `Arc`.

pub mod error;
pub mod log;
pub mod prompt;
pub mod storage;

pub use error::BridgeError;

pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use prompt::{InteractivePrompt, PromptChoice};
pub use storage::FileSystemAccess;
