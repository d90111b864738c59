//! Workspace umbrella crate.
//!
//! Host applications can depend on `catalog-transfer-workspace` and pick the
//! documented features instead of wiring each workspace crate individually:
//!
//! - `desktop-shims` (default): the [`core_service`] façade with desktop
//!   bridges (`TokioFileSystem`, `ConsolePrompt`) injected as defaults.
//! - `local-provider`: the JSON-backed [`provider_local`] catalog adapter.

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "local-provider")]
pub use provider_local;
