//! # Transfer Module
//!
//! Moves a user's library from one catalog provider to another.
//!
//! ## Overview
//!
//! This module finds which entities of the source catalog are missing at the
//! destination and stages them there, by:
//! - Short-circuiting entities the destination already has
//! - Restoring entities from the persistent ID mapping
//! - Searching the destination for exact matches
//! - Asking the user for an ID when nothing else works
//!
//! ## Components
//!
//! - **Transfer Job State Machine** (`job`): Run lifecycle and counters
//! - **Matcher** (`matcher`): Search queries and exact-match rules per kind
//! - **Reconciliation Engine** (`engine`): The per-entity resolution pipeline
//! - **Submission Coordinator** (`submission`): Commits staged entities and reloads
//! - **Transfer Coordinator** (`coordinator`): Commands, admission control and cancellation

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod job;
pub mod matcher;
pub mod submission;

pub use coordinator::{
    CatalogState, Command, CommandOutcome, CommandQueue, Row, StateSlot, TransferCoordinator,
};
pub use engine::{MappingPolicy, ReconciliationEngine, Resolution};
pub use error::{Result, TransferError};
pub use job::{TransferJob, TransferJobId, TransferStats, TransferStatus};
pub use matcher::Matchable;
pub use submission::{SubmissionCoordinator, SubmissionReport};
pub use tokio_util::sync::CancellationToken;
