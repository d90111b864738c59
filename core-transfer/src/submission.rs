//! Committing staged entities to a provider
//!
//! Dirty entities of one snapshot are sent as a single batch (one
//! `add_playlist` call per playlist), then the snapshot is reloaded from the
//! provider so it reflects the provider's own view, IDs included.

use core_catalog::{CatalogProvider, EntityKind, ProviderEntity, Snapshot};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{Result, TransferError};

/// Result of one submission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionReport {
    /// No entity was staged; the provider was not called.
    NothingToSubmit,
    Submitted {
        count: usize,
        /// Tracks carried inside submitted playlists
        tracks: usize,
    },
}

impl SubmissionReport {
    /// Human-readable summary, e.g. `2 playlist(s) with 31 track(s)`.
    pub fn describe(&self, kind: EntityKind) -> String {
        match self {
            SubmissionReport::NothingToSubmit => format!("No {}s to submit", kind),
            SubmissionReport::Submitted { count, tracks } if kind == EntityKind::Playlist => {
                format!("{} playlist(s) with {} track(s)", count, tracks)
            }
            SubmissionReport::Submitted { count, .. } => format!("{} {}(s)", count, kind),
        }
    }
}

/// Submits staged entities and refreshes snapshots from their provider
#[derive(Clone, Default)]
pub struct SubmissionCoordinator {
    event_bus: Option<EventBus>,
}

impl SubmissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Submit every dirty entity of `snapshot` to `provider`.
    ///
    /// After a successful submission the snapshot is reloaded, which clears
    /// the dirty flags. A failed reload is logged and reported as an event;
    /// the submission itself still counts.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Provider`] if the provider rejects the batch.
    /// The staged entities stay dirty so the submission can be retried.
    #[instrument(skip_all, fields(kind = %E::KIND, provider = provider.name()))]
    pub async fn submit<E: ProviderEntity>(
        &self,
        provider: &dyn CatalogProvider,
        snapshot: &mut Snapshot<E>,
    ) -> Result<SubmissionReport> {
        let staged = snapshot.dirty_entities();
        if staged.is_empty() {
            info!("There is nothing to submit");
            self.emit(CatalogEvent::NothingToSubmit {
                kind: E::KIND.to_string(),
                provider: provider.name().to_string(),
            });
            return Ok(SubmissionReport::NothingToSubmit);
        }

        let count = staged.len();
        let tracks: usize = staged.iter().map(|e| e.nested_tracks()).sum();
        info!(count, tracks, "Submitting staged entities");

        if let Err(e) = E::submit(provider, &staged).await {
            error!(error = %e, "Submission failed");
            self.emit(CatalogEvent::SubmitFailed {
                kind: E::KIND.to_string(),
                provider: provider.name().to_string(),
                message: e.to_string(),
            });
            return Err(TransferError::Provider(e));
        }

        let report = SubmissionReport::Submitted { count, tracks };
        info!("Submitted {} to {}", report.describe(E::KIND), provider.name());
        self.emit(CatalogEvent::Submitted {
            kind: E::KIND.to_string(),
            provider: provider.name().to_string(),
            count: count as u64,
            tracks: tracks as u64,
        });

        if let Err(e) = self.reload(provider, snapshot).await {
            warn!(error = %e, "Reload after submission failed");
        }

        Ok(report)
    }

    /// Replace the contents of `snapshot` with a fresh listing from
    /// `provider`, in sorted order. Returns the number of entities loaded.
    ///
    /// On failure the snapshot is left empty.
    #[instrument(skip_all, fields(kind = %E::KIND, provider = provider.name()))]
    pub async fn reload<E: ProviderEntity>(
        &self,
        provider: &dyn CatalogProvider,
        snapshot: &mut Snapshot<E>,
    ) -> Result<usize> {
        snapshot.clear();

        match E::list(provider).await {
            Ok(entities) => {
                let count = entities.len();
                snapshot.load(entities);
                info!(count, "Loaded");
                self.emit(CatalogEvent::Loaded {
                    kind: E::KIND.to_string(),
                    provider: provider.name().to_string(),
                    count: count as u64,
                });
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "Load failed");
                self.emit(CatalogEvent::LoadFailed {
                    kind: E::KIND.to_string(),
                    provider: provider.name().to_string(),
                    message: e.to_string(),
                });
                Err(TransferError::Provider(e))
            }
        }
    }

    fn emit(&self, event: CatalogEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Catalog(event)).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let report = SubmissionReport::Submitted { count: 2, tracks: 31 };
        assert_eq!(report.describe(EntityKind::Playlist), "2 playlist(s) with 31 track(s)");
        assert_eq!(report.describe(EntityKind::Album), "2 album(s)");
        assert_eq!(
            SubmissionReport::NothingToSubmit.describe(EntityKind::Track),
            "No tracks to submit"
        );
    }
}
