//! # Transfer Job State Machine
//!
//! Tracks one transfer run from start to finish with validated transitions.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Running → Completed
//!           ↓
//!        Aborted
//! ```
//!
//! A run that meets empty catalogs, zero matches or failing searches still
//! completes. Only cancellation and unrecoverable errors abort.
//!
//! ## Usage
//!
//! ```rust
//! use core_catalog::EntityKind;
//! use core_transfer::{TransferJob, TransferStats, TransferStatus};
//!
//! let job = TransferJob::new(EntityKind::Track, "Spotify", "Tidal");
//! let job = job.start().unwrap();
//!
//! let mut stats = TransferStats::default();
//! stats.processed = 3;
//! stats.matched = 2;
//!
//! let job = job.complete(stats).unwrap();
//! assert_eq!(job.status, TransferStatus::Completed);
//! assert_eq!(job.stats.transferred(), 2);
//! ```

use chrono::{DateTime, Utc};
use core_catalog::EntityKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{Result, TransferError};

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a transfer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferJobId(Uuid);

impl TransferJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a job ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s).map_err(|e| TransferError::InvalidJobId(e.to_string()))?,
        ))
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TransferJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransferJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TransferJobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TransferJobId> for Uuid {
    fn from(id: TransferJobId) -> Self {
        id.0
    }
}

// ============================================================================
// Status Types
// ============================================================================

/// Lifecycle state of a transfer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Created, not started
    Idle,
    Running,
    Completed,
    /// Stopped early by cancellation or an unrecoverable error
    Aborted,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Idle => "idle",
            TransferStatus::Running => "running",
            TransferStatus::Completed => "completed",
            TransferStatus::Aborted => "aborted",
        }
    }
}

impl FromStr for TransferStatus {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(TransferStatus::Idle),
            "running" => Ok(TransferStatus::Running),
            "completed" => Ok(TransferStatus::Completed),
            "aborted" => Ok(TransferStatus::Aborted),
            _ => Err(TransferError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters collected while a transfer runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    /// Source entities handled (for playlists: source tracks)
    pub processed: u64,
    /// Already present at the destination; only the mapping was recorded
    pub already_present: u64,
    /// Restored from a stored mapping
    pub restored: u64,
    /// Found by search with an exact match
    pub matched: u64,
    /// Supplied by the user
    pub manual: u64,
    /// Left out after an empty manual answer
    pub skipped: u64,
    /// Destination playlists staged
    pub playlists: u64,
    /// Tracks placed into staged playlists
    pub playlist_tracks: u64,
}

impl TransferStats {
    /// Entities newly staged at the destination.
    pub fn transferred(&self) -> u64 {
        self.restored + self.matched + self.manual
    }
}

// ============================================================================
// Transfer Job Entity
// ============================================================================

/// One transfer run of a single entity kind between two providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferJob {
    pub id: TransferJobId,
    pub kind: EntityKind,
    /// Source provider name
    pub source: String,
    /// Destination provider name
    pub destination: String,
    pub status: TransferStatus,
    pub stats: TransferStats,
    /// Why the run aborted
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransferJob {
    pub fn new(kind: EntityKind, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            id: TransferJobId::new(),
            kind,
            source: source.into(),
            destination: destination.into(),
            status: TransferStatus::Idle,
            stats: TransferStats::default(),
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Start the run
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Idle`
    pub fn start(mut self) -> Result<Self> {
        self.validate_transition(TransferStatus::Running)?;
        self.status = TransferStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(self)
    }

    /// Finish the run with its final counters
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Running`
    pub fn complete(mut self, stats: TransferStats) -> Result<Self> {
        self.validate_transition(TransferStatus::Completed)?;
        self.status = TransferStatus::Completed;
        self.stats = stats;
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// Stop the run early, keeping the counters reached so far
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Running`
    pub fn abort(mut self, stats: TransferStats, reason: impl Into<String>) -> Result<Self> {
        self.validate_transition(TransferStatus::Aborted)?;
        self.status = TransferStatus::Aborted;
        self.stats = stats;
        self.error_message = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// Wall-clock run time, once the job has finished.
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds().max(0) as u64),
            _ => None,
        }
    }

    fn validate_transition(&self, to: TransferStatus) -> Result<()> {
        let valid = matches!(
            (self.status, to),
            (TransferStatus::Idle, TransferStatus::Running)
                | (TransferStatus::Running, TransferStatus::Completed)
                | (TransferStatus::Running, TransferStatus::Aborted)
        );

        if !valid {
            return Err(TransferError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.status.as_str(),
                    to.as_str()
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TransferJob {
        TransferJob::new(EntityKind::Album, "Spotify", "Tidal")
    }

    #[test]
    fn test_job_id_from_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = TransferJobId::from_string(uuid_str).unwrap();
        assert_eq!(id.as_str(), uuid_str);
        assert!(TransferJobId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("RUNNING".parse::<TransferStatus>().unwrap(), TransferStatus::Running);
        assert_eq!("aborted".parse::<TransferStatus>().unwrap(), TransferStatus::Aborted);
        assert!("failed".parse::<TransferStatus>().is_err());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(!TransferStatus::Running.is_terminal());
    }

    #[test]
    fn test_stats_transferred() {
        let stats = TransferStats {
            processed: 9,
            already_present: 2,
            restored: 1,
            matched: 3,
            manual: 1,
            skipped: 2,
            ..Default::default()
        };
        assert_eq!(stats.transferred(), 5);
    }

    #[test]
    fn test_job_lifecycle() {
        let job = job();
        assert_eq!(job.status, TransferStatus::Idle);
        assert!(job.duration_ms().is_none());

        let job = job.start().unwrap();
        assert_eq!(job.status, TransferStatus::Running);
        assert!(job.started_at.is_some());

        let stats = TransferStats {
            processed: 1,
            matched: 1,
            ..Default::default()
        };
        let job = job.complete(stats).unwrap();
        assert_eq!(job.status, TransferStatus::Completed);
        assert_eq!(job.stats, stats);
        assert!(job.duration_ms().is_some());
    }

    #[test]
    fn test_job_abort_keeps_reason() {
        let job = job().start().unwrap();
        let job = job.abort(TransferStats::default(), "cancelled by user").unwrap();
        assert_eq!(job.status, TransferStatus::Aborted);
        assert_eq!(job.error_message.as_deref(), Some("cancelled by user"));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(matches!(
            job().complete(TransferStats::default()),
            Err(TransferError::InvalidStateTransition { .. })
        ));
        assert!(job().abort(TransferStats::default(), "x").is_err());

        let running = job().start().unwrap();
        assert!(running.clone().start().is_err());

        let done = running.complete(TransferStats::default()).unwrap();
        assert!(done.clone().abort(TransferStats::default(), "late").is_err());
        assert!(done.complete(TransferStats::default()).is_err());
    }
}
