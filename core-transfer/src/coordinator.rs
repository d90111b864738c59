//! # Transfer Coordinator
//!
//! Owns the two providers, their snapshots and the shared mapping store, and
//! runs the long-running operations against them one at a time.
//!
//! ## Overview
//!
//! Every operation is a [`Command`]:
//! - `Load`: replace one snapshot with a fresh provider listing
//! - `Transfer`: reconcile one kind from one side into the other
//! - `Submit`: commit the staged entities of one snapshot
//!
//! Admission control is a single-permit semaphore: while a command runs,
//! [`TransferCoordinator::execute`] rejects any other with
//! [`TransferError::Busy`]. The running command can be stopped with
//! [`TransferCoordinator::cancel`]; a transfer checks the signal between
//! entities and keeps what it has staged.
//!
//! Hosts that prefer queueing over rejection can drive the coordinator
//! through a [`CommandQueue`], which runs commands in arrival order and
//! answers each on its own channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_catalog::{EntityKind, Side};
//! use core_transfer::{Command, TransferCoordinator};
//!
//! let coordinator = TransferCoordinator::new(spotify, tidal, mappings, prompt, event_bus);
//! coordinator.execute(Command::Load { kind: EntityKind::Album, side: Side::A }).await?;
//! coordinator.execute(Command::Load { kind: EntityKind::Album, side: Side::B }).await?;
//! coordinator
//!     .execute(Command::Transfer { kind: EntityKind::Album, from: Side::A, selection: None })
//!     .await?;
//! coordinator.execute(Command::Submit { kind: EntityKind::Album, side: Side::B }).await?;
//! ```

use std::sync::Arc;

use bridge_traits::prompt::InteractivePrompt;
use core_catalog::{
    Album, Artist, CatalogEntity, CatalogProvider, EntityKind, EntityStatus, MappingStore,
    Playlist, ProviderEntity, Side, SnapshotPair, Track,
};
use core_runtime::config::TransferSettings;
use core_runtime::events::EventBus;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::engine::{MappingPolicy, ReconciliationEngine};
use crate::job::TransferJob;
use crate::matcher::Matchable;
use crate::submission::{SubmissionCoordinator, SubmissionReport};
use crate::{Result, TransferError};

// ============================================================================
// State
// ============================================================================

/// Snapshots of every kind for both providers
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub artists: SnapshotPair<Artist>,
    pub albums: SnapshotPair<Album>,
    pub tracks: SnapshotPair<Track>,
    pub playlists: SnapshotPair<Playlist>,
}

impl CatalogState {
    pub fn new(provider_a: &str, provider_b: &str) -> Self {
        Self {
            artists: SnapshotPair::new(provider_a, provider_b),
            albums: SnapshotPair::new(provider_a, provider_b),
            tracks: SnapshotPair::new(provider_a, provider_b),
            playlists: SnapshotPair::new(provider_a, provider_b),
        }
    }
}

/// Locates the snapshot pair of an entity kind inside [`CatalogState`].
pub trait StateSlot: ProviderEntity {
    fn slot(state: &CatalogState) -> &SnapshotPair<Self>;
    fn slot_mut(state: &mut CatalogState) -> &mut SnapshotPair<Self>;
}

macro_rules! state_slot {
    ($entity:ty, $field:ident) => {
        impl StateSlot for $entity {
            fn slot(state: &CatalogState) -> &SnapshotPair<Self> {
                &state.$field
            }

            fn slot_mut(state: &mut CatalogState) -> &mut SnapshotPair<Self> {
                &mut state.$field
            }
        }
    };
}

state_slot!(Artist, artists);
state_slot!(Album, albums);
state_slot!(Track, tracks);
state_slot!(Playlist, playlists);

/// One snapshot row as a table view would render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub display_name: String,
    pub status: EntityStatus,
    /// Number of tracks for playlists, zero otherwise
    pub tracks: usize,
}

// ============================================================================
// Commands
// ============================================================================

/// A long-running operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Load {
        kind: EntityKind,
        side: Side,
    },
    /// Stage entities of `kind` from `from` at the opposite side.
    ///
    /// `selection` names the source playlists to transfer; `None` transfers
    /// all of them. It is ignored for other kinds.
    Transfer {
        kind: EntityKind,
        from: Side,
        selection: Option<Vec<String>>,
    },
    Submit {
        kind: EntityKind,
        side: Side,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Loaded { count: usize },
    Transferred(TransferJob),
    Submitted(SubmissionReport),
    /// The user declined the submit confirmation.
    SubmitDeclined,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Runs commands against both providers with single-slot admission control
pub struct TransferCoordinator {
    provider_a: Arc<dyn CatalogProvider>,
    provider_b: Arc<dyn CatalogProvider>,
    state: Mutex<CatalogState>,
    mappings: Arc<Mutex<MappingStore>>,
    engine: ReconciliationEngine,
    submitter: SubmissionCoordinator,
    prompt: Arc<dyn InteractivePrompt>,
    confirm_submit: bool,
    permit: Semaphore,
    active: Mutex<Option<CancellationToken>>,
}

impl TransferCoordinator {
    pub fn new(
        provider_a: Arc<dyn CatalogProvider>,
        provider_b: Arc<dyn CatalogProvider>,
        mappings: Arc<Mutex<MappingStore>>,
        prompt: Arc<dyn InteractivePrompt>,
        event_bus: EventBus,
    ) -> Self {
        let state = CatalogState::new(provider_a.name(), provider_b.name());
        Self {
            provider_a,
            provider_b,
            state: Mutex::new(state),
            mappings,
            engine: ReconciliationEngine::new(prompt.clone()).with_event_bus(event_bus.clone()),
            submitter: SubmissionCoordinator::new().with_event_bus(event_bus),
            prompt,
            confirm_submit: false,
            permit: Semaphore::new(1),
            active: Mutex::new(None),
        }
    }

    /// Apply the transfer switches from the runtime configuration.
    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        let policy = if settings.revalidate_mappings {
            MappingPolicy::Revalidate
        } else {
            MappingPolicy::Trust
        };
        self.engine = self
            .engine
            .with_policy(policy)
            .with_fallback_track_search(settings.fallback_track_search);
        self.confirm_submit = settings.confirm_submit;
        self
    }

    pub fn provider(&self, side: Side) -> &Arc<dyn CatalogProvider> {
        match side {
            Side::A => &self.provider_a,
            Side::B => &self.provider_b,
        }
    }

    /// Shared handle to the mapping store.
    pub fn mappings(&self) -> Arc<Mutex<MappingStore>> {
        Arc::clone(&self.mappings)
    }

    /// Whether a command is currently running.
    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Busy`] without side effects if another
    /// command is running, or the command's own failure.
    #[instrument(skip(self))]
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome> {
        let _permit = self.permit.try_acquire().map_err(|_| {
            debug!("Rejected: another command is running");
            TransferError::Busy
        })?;

        let cancel = CancellationToken::new();
        *self.active.lock().await = Some(cancel.clone());

        let result = self.dispatch(command, &cancel).await;

        *self.active.lock().await = None;
        result
    }

    /// Signal the running command to stop. Returns `false` when idle.
    pub async fn cancel(&self) -> bool {
        match self.active.lock().await.as_ref() {
            Some(token) => {
                info!("Cancelling running command");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Rows of one snapshot with their status against the opposite side.
    ///
    /// Waits while a command holds the snapshots.
    pub async fn rows(&self, kind: EntityKind, side: Side) -> Vec<Row> {
        let state = self.state.lock().await;
        match kind {
            EntityKind::Artist => rows_of(&state.artists, side),
            EntityKind::Album => rows_of(&state.albums, side),
            EntityKind::Track => rows_of(&state.tracks, side),
            EntityKind::Playlist => rows_of(&state.playlists, side),
        }
    }

    /// Read access to the snapshots.
    pub async fn with_state<R>(&self, f: impl FnOnce(&CatalogState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    async fn dispatch(&self, command: Command, cancel: &CancellationToken) -> Result<CommandOutcome> {
        match command {
            Command::Load { kind, side } => match kind {
                EntityKind::Artist => self.load::<Artist>(side).await,
                EntityKind::Album => self.load::<Album>(side).await,
                EntityKind::Track => self.load::<Track>(side).await,
                EntityKind::Playlist => self.load::<Playlist>(side).await,
            },
            Command::Transfer {
                kind,
                from,
                selection,
            } => match kind {
                EntityKind::Artist => self.transfer::<Artist>(from, cancel).await,
                EntityKind::Album => self.transfer::<Album>(from, cancel).await,
                EntityKind::Track => self.transfer::<Track>(from, cancel).await,
                EntityKind::Playlist => {
                    self.transfer_playlists(from, selection.as_deref(), cancel)
                        .await
                }
            },
            Command::Submit { kind, side } => match kind {
                EntityKind::Artist => self.submit::<Artist>(side).await,
                EntityKind::Album => self.submit::<Album>(side).await,
                EntityKind::Track => self.submit::<Track>(side).await,
                EntityKind::Playlist => self.submit::<Playlist>(side).await,
            },
        }
    }

    async fn load<E: StateSlot>(&self, side: Side) -> Result<CommandOutcome> {
        let provider = self.provider(side);
        let mut state = self.state.lock().await;
        let snapshot = E::slot_mut(&mut state).get_mut(side);
        let count = self.submitter.reload(provider.as_ref(), snapshot).await?;
        Ok(CommandOutcome::Loaded { count })
    }

    async fn transfer<E: StateSlot + Matchable>(
        &self,
        from: Side,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        let destination = self.provider(from.opposite());
        let mut state = self.state.lock().await;
        let mut mappings = self.mappings.lock().await;
        let (source, staged) = E::slot_mut(&mut state).split(from);

        let job = self
            .engine
            .transfer(source, staged, destination.as_ref(), &mut *mappings, cancel)
            .await?;
        Ok(CommandOutcome::Transferred(job))
    }

    async fn transfer_playlists(
        &self,
        from: Side,
        selection: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        let destination = self.provider(from.opposite());
        let mut state = self.state.lock().await;
        let mut mappings = self.mappings.lock().await;
        let (source, staged) = state.playlists.split(from);

        let job = self
            .engine
            .transfer_playlists(
                source,
                staged,
                destination.as_ref(),
                &mut *mappings,
                selection,
                cancel,
            )
            .await?;
        Ok(CommandOutcome::Transferred(job))
    }

    async fn submit<E: StateSlot>(&self, side: Side) -> Result<CommandOutcome> {
        let provider = self.provider(side);

        if self.confirm_submit {
            let (count, tracks) = {
                let state = self.state.lock().await;
                let staged = E::slot(&state).get(side).iter().filter(|e| e.is_dirty());
                staged.fold((0, 0), |(count, tracks), e| (count + 1, tracks + e.nested_tracks()))
            };

            if count > 0 {
                let summary = SubmissionReport::Submitted { count, tracks }.describe(E::KIND);
                let choice = self
                    .prompt
                    .prompt_choice(
                        "Submit",
                        &format!("Add {} to {}?", summary, provider.name()),
                    )
                    .await
                    .map_err(TransferError::Prompt)?;
                if !choice.is_confirmed() {
                    info!(kind = %E::KIND, "Submission declined");
                    return Ok(CommandOutcome::SubmitDeclined);
                }
            }
        }

        let mut state = self.state.lock().await;
        let snapshot = E::slot_mut(&mut state).get_mut(side);
        let report = self.submitter.submit(provider.as_ref(), snapshot).await?;
        Ok(CommandOutcome::Submitted(report))
    }
}

fn rows_of<E: CatalogEntity>(pair: &SnapshotPair<E>, side: Side) -> Vec<Row> {
    pair.get(side)
        .iter()
        .enumerate()
        .filter_map(|(index, entity)| {
            Some(Row {
                id: entity.id().to_string(),
                display_name: entity.display_name(),
                status: pair.status(side, index)?,
                tracks: entity.nested_tracks(),
            })
        })
        .collect()
}

// ============================================================================
// Command Queue
// ============================================================================

struct QueuedCommand {
    command: Command,
    reply: oneshot::Sender<Result<CommandOutcome>>,
}

/// Runs commands on a background worker in arrival order
pub struct CommandQueue {
    sender: mpsc::Sender<QueuedCommand>,
    worker: JoinHandle<()>,
}

impl CommandQueue {
    /// Start the worker. `capacity` bounds the number of waiting commands.
    pub fn spawn(coordinator: Arc<TransferCoordinator>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<QueuedCommand>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(queued) = receiver.recv().await {
                let result = coordinator.execute(queued.command).await;
                if queued.reply.send(result).is_err() {
                    debug!("Command result dropped: caller went away");
                }
            }
            debug!("Command queue stopped");
        });

        Self { sender, worker }
    }

    /// Queue `command` and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::QueueClosed`] if the worker has stopped.
    pub async fn send(&self, command: Command) -> Result<CommandOutcome> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(QueuedCommand { command, reply })
            .await
            .map_err(|_| TransferError::QueueClosed)?;
        response.await.map_err(|_| TransferError::QueueClosed)?
    }

    /// Stop accepting commands and wait for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "Command worker ended abnormally");
        }
    }
}
