//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] and two catalog providers into
//! a running transfer core. The identity mapping file is loaded once at
//! bootstrap and written back at shutdown, only if a run recorded new
//! mappings. Desktop hosts typically enable the `desktop-shims` feature so
//! that `TokioFileSystem` and `ConsolePrompt` are injected when the config
//! does not name its own bridges.
//!
//! ```ignore
//! let config = CoreConfig::builder().mapping_path("mappings.json").build()?;
//! let service = CoreService::bootstrap(config, spotify, tidal).await?;
//!
//! service.execute(Command::Load { kind: EntityKind::Track, side: Side::A }).await?;
//! service.execute(Command::Load { kind: EntityKind::Track, side: Side::B }).await?;
//! service.execute(Command::Transfer { kind: EntityKind::Track, from: Side::A, selection: None }).await?;
//! service.execute(Command::Submit { kind: EntityKind::Track, side: Side::B }).await?;
//!
//! service.shutdown().await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_catalog::{CatalogProvider, MappingStore};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use core_transfer::{Command, CommandOutcome, CommandQueue, TransferCoordinator};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    coordinator: Arc<TransferCoordinator>,
    mappings: Arc<Mutex<MappingStore>>,
    event_bus: EventBus,
}

impl CoreService {
    /// Validate `config`, load the mapping file and build the coordinator.
    ///
    /// A missing or malformed mapping file is not an error: the store starts
    /// empty and the problem is logged.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid or both providers share a name, since
    /// mapping keys could not tell the two sides apart.
    #[instrument(skip_all, fields(a = provider_a.name(), b = provider_b.name()))]
    pub async fn bootstrap(
        config: CoreConfig,
        provider_a: Arc<dyn CatalogProvider>,
        provider_b: Arc<dyn CatalogProvider>,
    ) -> Result<Self> {
        config.validate()?;

        if provider_a.name() == provider_b.name() {
            return Err(CoreError::InitializationFailed(format!(
                "Both sides use provider '{}'",
                provider_a.name()
            )));
        }

        let store = MappingStore::load(config.file_system.as_ref(), &config.mapping_path).await;
        let mappings = Arc::new(Mutex::new(store));
        let event_bus = EventBus::new(config.event_buffer_size);

        let coordinator = TransferCoordinator::new(
            provider_a,
            provider_b,
            Arc::clone(&mappings),
            Arc::clone(&config.prompt),
            event_bus.clone(),
        )
        .with_settings(config.transfer);

        info!(mapping_path = %config.mapping_path.display(), "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
            mappings,
            event_bus,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn coordinator(&self) -> Arc<TransferCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Run one command, rejecting it if another is still running.
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome> {
        Ok(self.coordinator.execute(command).await?)
    }

    /// Start a worker that runs commands one after another.
    pub fn command_queue(&self, capacity: usize) -> CommandQueue {
        CommandQueue::spawn(self.coordinator(), capacity)
    }

    /// Cancel the running command, if any.
    pub async fn cancel(&self) -> bool {
        self.coordinator.cancel().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Write the mapping file if new mappings were recorded.
    ///
    /// Returns whether a write happened. A failed write is reported as an
    /// event and returned; the in-memory mappings stay intact so the save can
    /// be retried.
    #[instrument(skip(self), fields(path = %self.config.mapping_path.display()))]
    pub async fn save_mappings(&self) -> Result<bool> {
        let mut store = self.mappings.lock().await;
        if !store.is_modified() {
            return Ok(false);
        }

        let path = self.config.mapping_path.display().to_string();
        match store
            .save(self.config.file_system.as_ref(), &self.config.mapping_path)
            .await
        {
            Ok(()) => {
                self.emit(CatalogEvent::MappingsSaved { path });
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, "Failed to save mappings");
                self.emit(CatalogEvent::MappingsSaveFailed {
                    path,
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Cancel any running command and persist the mapping store.
    pub async fn shutdown(&self) -> Result<()> {
        if self.cancel().await {
            info!("Cancelled running command for shutdown");
        }
        self.save_mappings().await?;
        info!("Core service stopped");
        Ok(())
    }

    fn emit(&self, event: CatalogEvent) {
        self.event_bus.emit(CoreEvent::Catalog(event)).ok();
    }
}
