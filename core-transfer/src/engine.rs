//! # Reconciliation Engine
//!
//! Walks a source snapshot and stages every entity missing from the
//! destination snapshot.
//!
//! ## Resolution order
//!
//! For each source entity the first step that yields a destination entity
//! wins:
//!
//! 1. **Already present**: the destination snapshot holds an entity with the
//!    same simplified name. Only the mapping is recorded.
//! 2. **Restored**: the mapping store knows a destination ID, and the
//!    destination provider still returns it.
//! 3. **Matched**: a provider search returns an exact match.
//! 4. **Manual**: the user supplies an ID through the [`InteractivePrompt`].
//!    An empty answer skips the entity; cancelling aborts the run.
//!
//! Staged entities are marked dirty and inserted at the top of the
//! destination snapshot. Nothing is submitted here; see
//! [`SubmissionCoordinator`](crate::SubmissionCoordinator).
//!
//! Playlists are resolved track by track against the union of every
//! destination playlist's tracks, so the staged playlist mirrors the source
//! order.

use std::sync::Arc;

use bridge_traits::prompt::InteractivePrompt;
use core_catalog::{
    simplified_name, CatalogEntity, CatalogProvider, EntityKind, MappingStore, Playlist,
    ProviderPair, Snapshot, Track,
};
use core_runtime::events::{CoreEvent, EventBus, TransferEvent};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::job::{TransferJob, TransferStats};
use crate::matcher::Matchable;
use crate::{Result, TransferError};

/// How far a stored mapping is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingPolicy {
    /// Accept whatever the destination returns for the stored ID.
    #[default]
    Trust,
    /// Accept a restored entity only if it is an exact match; otherwise fall
    /// through to search.
    Revalidate,
}

/// How one source entity was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    AlreadyPresent,
    Restored,
    Matched,
    Manual,
    Skipped,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::AlreadyPresent => "already_present",
            Resolution::Restored => "restored",
            Resolution::Matched => "matched",
            Resolution::Manual => "manual",
            Resolution::Skipped => "skipped",
        }
    }

    /// Whether the resolved entity is new to the destination.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Resolution::Restored | Resolution::Matched | Resolution::Manual
        )
    }

    fn record(&self, stats: &mut TransferStats) {
        stats.processed += 1;
        match self {
            Resolution::AlreadyPresent => stats.already_present += 1,
            Resolution::Restored => stats.restored += 1,
            Resolution::Matched => stats.matched += 1,
            Resolution::Manual => stats.manual += 1,
            Resolution::Skipped => stats.skipped += 1,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination side of one run.
struct Target<'a> {
    provider: &'a dyn CatalogProvider,
    pair: ProviderPair,
    mappings: &'a mut MappingStore,
}

impl Target<'_> {
    fn record<E: CatalogEntity>(&mut self, source: &E, destination: &E) -> Result<()> {
        self.mappings
            .add(E::KIND, &self.pair, source.id(), destination.id())?;
        Ok(())
    }
}

fn kind_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Artist => "Artist",
        EntityKind::Album => "Album",
        EntityKind::Track => "Track",
        EntityKind::Playlist => "Playlist",
    }
}

/// Stages source entities at the destination
pub struct ReconciliationEngine {
    prompt: Arc<dyn InteractivePrompt>,
    policy: MappingPolicy,
    fallback_track_search: bool,
    event_bus: Option<EventBus>,
}

impl ReconciliationEngine {
    pub fn new(prompt: Arc<dyn InteractivePrompt>) -> Self {
        Self {
            prompt,
            policy: MappingPolicy::default(),
            fallback_track_search: true,
            event_bus: None,
        }
    }

    pub fn with_policy(mut self, policy: MappingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Retry track searches without the album title when the first search
    /// comes back empty. On by default.
    pub fn with_fallback_track_search(mut self, enabled: bool) -> Self {
        self.fallback_track_search = enabled;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn policy(&self) -> MappingPolicy {
        self.policy
    }

    /// Transfer every entity of `source` missing from `destination`.
    ///
    /// `provider` must be the provider `destination` was loaded from. The
    /// returned job is `Completed`, or `Aborted` when `cancel` fired or the
    /// user cancelled a prompt; staged entities stay in `destination` either
    /// way.
    ///
    /// # Errors
    ///
    /// Fails when the prompt itself fails or the mapping store rejects a
    /// write. The run is aborted and everything staged so far is kept.
    #[instrument(
        skip_all,
        fields(kind = %E::KIND, source = source.provider(), destination = destination.provider())
    )]
    pub async fn transfer<E: Matchable>(
        &self,
        source: &Snapshot<E>,
        destination: &mut Snapshot<E>,
        provider: &dyn CatalogProvider,
        mappings: &mut MappingStore,
        cancel: &CancellationToken,
    ) -> Result<TransferJob> {
        let job = TransferJob::new(E::KIND, source.provider(), destination.provider()).start()?;
        self.emit_started(&job, source.len() as u64);
        info!(job_id = %job.id, total = source.len(), "Transfer started");

        let mut target = Target {
            provider,
            pair: ProviderPair::new(source.provider(), destination.provider()),
            mappings,
        };
        let mut stats = TransferStats::default();

        let outcome = async {
            for entity in source.iter() {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }

                let (resolution, resolved) = self.resolve(entity, destination, &mut target).await?;
                resolution.record(&mut stats);

                if let Some(mut resolved) = resolved.filter(|_| resolution.is_transfer()) {
                    resolved.set_dirty(true);
                    destination.insert(resolved);
                }
                self.emit_item(&job, &entity.simplified_name(), resolution);
            }
            Ok::<(), TransferError>(())
        }
        .await;

        self.finish(job, stats, outcome)
    }

    /// Transfer playlists, optionally restricted to the source playlists named
    /// in `selection` (compared by simplified name).
    ///
    /// Each selected playlist is staged at the destination with its tracks
    /// cleared and re-resolved in source order. A playlist missing at the
    /// destination is created as a shell with an empty ID.
    #[instrument(
        skip_all,
        fields(source = source.provider(), destination = destination.provider())
    )]
    pub async fn transfer_playlists(
        &self,
        source: &Snapshot<Playlist>,
        destination: &mut Snapshot<Playlist>,
        provider: &dyn CatalogProvider,
        mappings: &mut MappingStore,
        selection: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<TransferJob> {
        let selected: Vec<&Playlist> = source
            .iter()
            .filter(|playlist| {
                selection.map_or(true, |names| {
                    names
                        .iter()
                        .any(|name| simplified_name(name).to_lowercase() == playlist.match_key())
                })
            })
            .collect();
        let total: u64 = selected.iter().map(|p| p.num_tracks() as u64).sum();

        let job = TransferJob::new(EntityKind::Playlist, source.provider(), destination.provider())
            .start()?;
        self.emit_started(&job, total);
        info!(job_id = %job.id, playlists = selected.len(), total, "Playlist transfer started");

        // Every track already placed in some destination playlist.
        let mut namespace = Snapshot::<Track>::new(destination.provider());
        namespace.load(
            destination
                .iter()
                .flat_map(|playlist| playlist.tracks().iter().cloned())
                .collect(),
        );

        let mut target = Target {
            provider,
            pair: ProviderPair::new(source.provider(), destination.provider()),
            mappings,
        };
        let mut stats = TransferStats::default();

        let outcome = async {
            for playlist in selected {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }

                let name = playlist.simplified_name();
                if !destination.contains(&name) {
                    destination.insert(Playlist::shell(
                        playlist.name(),
                        playlist.description(),
                        playlist.is_public(),
                    )?);
                }
                let staged = destination
                    .find_mut(&name)
                    .ok_or_else(|| TransferError::NotFound(format!("playlist {}", name)))?;
                staged.clear_tracks();
                staged.set_dirty(true);
                stats.playlists += 1;
                debug!(playlist = %name, tracks = playlist.num_tracks(), "Staging playlist");

                for track in playlist.tracks() {
                    if cancel.is_cancelled() {
                        return Err(TransferError::Cancelled);
                    }

                    let (resolution, resolved) = self.resolve(track, &namespace, &mut target).await?;
                    resolution.record(&mut stats);

                    if let Some(resolved) = resolved {
                        if resolution.is_transfer() {
                            namespace.add(resolved.clone());
                        }
                        staged.add_track(resolved);
                        stats.playlist_tracks += 1;
                    }
                    self.emit_item(&job, &track.simplified_name(), resolution);
                }
            }
            Ok::<(), TransferError>(())
        }
        .await;

        self.finish(job, stats, outcome)
    }

    async fn resolve<E: Matchable>(
        &self,
        entity: &E,
        existing: &Snapshot<E>,
        target: &mut Target<'_>,
    ) -> Result<(Resolution, Option<E>)> {
        let name = entity.simplified_name();

        if let Some(present) = existing.find(&name) {
            let present = present.clone();
            target.record(entity, &present)?;
            debug!(%name, "Already present");
            return Ok((Resolution::AlreadyPresent, Some(present)));
        }

        if let Some(restored) = self.restore(entity, target).await? {
            info!(%name, destination_id = restored.id(), "Transfer [restored]");
            return Ok((Resolution::Restored, Some(restored)));
        }

        let (matched, last_query) = self.search(entity, target.provider).await;
        if let Some(matched) = matched {
            target.record(entity, &matched)?;
            info!(%name, destination_id = matched.id(), "Transfer [matched]");
            return Ok((Resolution::Matched, Some(matched)));
        }

        self.resolve_manually(entity, &last_query, target).await
    }

    async fn restore<E: Matchable>(&self, entity: &E, target: &Target<'_>) -> Result<Option<E>> {
        let Some(destination_id) = target.mappings.find(E::KIND, &target.pair, entity.id())? else {
            return Ok(None);
        };

        match E::fetch(target.provider, &destination_id).await {
            Ok(Some(candidate)) => match self.policy {
                MappingPolicy::Trust => Ok(Some(candidate)),
                MappingPolicy::Revalidate if entity.is_exact_match(&candidate) => {
                    Ok(Some(candidate))
                }
                MappingPolicy::Revalidate => {
                    warn!(
                        source_id = entity.id(),
                        destination_id = %destination_id,
                        "Stored mapping no longer matches, searching instead"
                    );
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(destination_id = %destination_id, "Mapped entity is gone");
                Ok(None)
            }
            Err(e) => {
                warn!(destination_id = %destination_id, error = %e, "Failed to fetch mapped entity");
                Ok(None)
            }
        }
    }

    /// First exact match across the search queries, and the last query tried.
    async fn search<E: Matchable>(
        &self,
        entity: &E,
        provider: &dyn CatalogProvider,
    ) -> (Option<E>, String) {
        let mut last_query = entity.simplified_name();

        for query in entity.search_queries(self.fallback_track_search) {
            debug!(%query, "Searching");
            let results = match E::search(provider, &query).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(%query, error = %e, "Search failed, treating as no results");
                    Vec::new()
                }
            };
            last_query = query;

            if !results.is_empty() {
                let matched = results.into_iter().find(|c| entity.is_exact_match(c));
                return (matched, last_query);
            }
        }

        (None, last_query)
    }

    async fn resolve_manually<E: Matchable>(
        &self,
        entity: &E,
        query: &str,
        target: &mut Target<'_>,
    ) -> Result<(Resolution, Option<E>)> {
        let provider = target.provider;
        let label = kind_label(E::KIND);
        let name = entity.simplified_name();
        let title = format!("{} not found on {}", label, provider.name());
        let hint = format!("(Paste {} id here)", label);
        let search_url = provider.get_search_url(query);
        let mut notice = String::new();

        loop {
            let message = format!(
                "{}{} NOT FOUND!\n{}\n{}\n\nPlease provide id manually (leave empty to skip):",
                notice, label, name, search_url
            );
            let answer = self
                .prompt
                .prompt_text(&title, &message, &hint)
                .await
                .map_err(TransferError::Prompt)?;

            let Some(answer) = answer else {
                info!(%name, "Manual resolution cancelled");
                return Err(TransferError::Cancelled);
            };
            let id = answer.trim();
            if id.is_empty() {
                info!(%name, "Skipped");
                return Ok((Resolution::Skipped, None));
            }

            match E::fetch(provider, id).await {
                Ok(Some(found)) => {
                    target.record(entity, &found)?;
                    info!(%name, destination_id = found.id(), "Transfer [manual]");
                    return Ok((Resolution::Manual, Some(found)));
                }
                Ok(None) => {
                    notice = format!("No {} with id '{}' on {}.\n\n", E::KIND, id, provider.name());
                }
                Err(e) => {
                    warn!(id, error = %e, "Manual lookup failed");
                    notice = format!("Looking up '{}' failed: {}\n\n", id, e);
                }
            }
        }
    }

    fn finish(
        &self,
        job: TransferJob,
        stats: TransferStats,
        outcome: Result<()>,
    ) -> Result<TransferJob> {
        match outcome {
            Ok(()) => {
                let job = job.complete(stats)?;
                info!(
                    job_id = %job.id,
                    processed = stats.processed,
                    transferred = stats.transferred(),
                    skipped = stats.skipped,
                    "Transfer completed"
                );
                self.emit(TransferEvent::Completed {
                    job_id: job.id.as_str(),
                    kind: job.kind.to_string(),
                    processed: stats.processed,
                    transferred: stats.transferred(),
                    skipped: stats.skipped,
                    duration_ms: job.duration_ms().unwrap_or_default(),
                });
                Ok(job)
            }
            Err(TransferError::Cancelled) => {
                let job = job.abort(stats, "cancelled")?;
                warn!(job_id = %job.id, processed = stats.processed, "Transfer cancelled");
                self.emit_aborted(&job);
                Ok(job)
            }
            Err(e) => {
                let job = job.abort(stats, e.to_string())?;
                warn!(job_id = %job.id, error = %e, "Transfer aborted");
                self.emit_aborted(&job);
                Err(e)
            }
        }
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Transfer(event)).ok();
        }
    }

    fn emit_started(&self, job: &TransferJob, total: u64) {
        self.emit(TransferEvent::Started {
            job_id: job.id.as_str(),
            kind: job.kind.to_string(),
            source: job.source.clone(),
            destination: job.destination.clone(),
            total,
        });
    }

    fn emit_item(&self, job: &TransferJob, name: &str, resolution: Resolution) {
        self.emit(TransferEvent::ItemResolved {
            job_id: job.id.as_str(),
            kind: job.kind.to_string(),
            name: name.to_string(),
            resolution: resolution.as_str().to_string(),
        });
    }

    fn emit_aborted(&self, job: &TransferJob) {
        self.emit(TransferEvent::Aborted {
            job_id: job.id.as_str(),
            kind: job.kind.to_string(),
            processed: job.stats.processed,
            transferred: job.stats.transferred(),
            reason: job.error_message.clone().unwrap_or_default(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::TransferStatus;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::prompt::PromptChoice;
    use core_catalog::{Album, Artist};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers prompts from a script and records every question asked.
    #[derive(Default)]
    struct ScriptedPrompt {
        answers: Mutex<VecDeque<Option<String>>>,
        asked: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[Option<&str>]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
                asked: Mutex::new(Vec::new()),
            })
        }

        fn asked(&self) -> Vec<(String, String, String)> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InteractivePrompt for ScriptedPrompt {
        async fn prompt_choice(&self, _title: &str, _message: &str) -> BridgeResult<PromptChoice> {
            Ok(PromptChoice::Confirmed)
        }

        async fn prompt_text(
            &self,
            title: &str,
            message: &str,
            hint: &str,
        ) -> BridgeResult<Option<String>> {
            self.asked
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string(), hint.to_string()));
            Ok(self.answers.lock().unwrap().pop_front().unwrap_or(None))
        }
    }

    /// Catalog of albums and artists with a call log.
    #[derive(Default)]
    struct FakeProvider {
        albums: Vec<Album>,
        artists: Vec<Artist>,
        failing_search: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl CatalogProvider for FakeProvider {
        fn name(&self) -> &str {
            "Dest"
        }

        async fn get_saved_artists(&self) -> BridgeResult<Vec<Artist>> {
            Ok(Vec::new())
        }

        async fn get_saved_albums(&self) -> BridgeResult<Vec<Album>> {
            Ok(Vec::new())
        }

        async fn get_saved_tracks(&self) -> BridgeResult<Vec<Track>> {
            Ok(Vec::new())
        }

        async fn get_playlists(&self) -> BridgeResult<Vec<Playlist>> {
            Ok(Vec::new())
        }

        async fn search_artist(&self, query: &str) -> BridgeResult<Vec<Artist>> {
            self.log(format!("search_artist:{}", query));
            if self.failing_search {
                return Err(BridgeError::RequestFailed("search down".to_string()));
            }
            Ok(self
                .artists
                .iter()
                .filter(|a| a.name().to_lowercase().contains(&query.to_lowercase()))
                .cloned()
                .collect())
        }

        async fn search_album(&self, query: &str) -> BridgeResult<Vec<Album>> {
            self.log(format!("search_album:{}", query));
            Ok(self
                .albums
                .iter()
                .filter(|a| a.display_name().to_lowercase() == query.to_lowercase())
                .cloned()
                .collect())
        }

        async fn search_track(&self, query: &str) -> BridgeResult<Vec<Track>> {
            self.log(format!("search_track:{}", query));
            Ok(Vec::new())
        }

        async fn get_artist(&self, id: &str) -> BridgeResult<Option<Artist>> {
            self.log(format!("get_artist:{}", id));
            Ok(self.artists.iter().find(|a| a.id() == id).cloned())
        }

        async fn get_album(&self, id: &str) -> BridgeResult<Option<Album>> {
            self.log(format!("get_album:{}", id));
            Ok(self.albums.iter().find(|a| a.id() == id).cloned())
        }

        async fn get_track(&self, id: &str) -> BridgeResult<Option<Track>> {
            self.log(format!("get_track:{}", id));
            Ok(None)
        }

        async fn add_saved_artists(&self, _artists: &[Artist]) -> BridgeResult<()> {
            Ok(())
        }

        async fn add_saved_albums(&self, _albums: &[Album]) -> BridgeResult<()> {
            Ok(())
        }

        async fn add_saved_tracks(&self, _tracks: &[Track]) -> BridgeResult<()> {
            Ok(())
        }

        async fn add_playlist(&self, _playlist: &Playlist) -> BridgeResult<String> {
            Ok("new".to_string())
        }

        fn get_search_url(&self, query: &str) -> String {
            format!("https://dest.example/search/{}", query)
        }
    }

    fn artist(id: &str, name: &str) -> Artist {
        Artist::new(id, name).unwrap()
    }

    fn album(id: &str, name: &str, artist: &str) -> Album {
        Album::new(id, name, artist).unwrap()
    }

    fn snapshot<E: CatalogEntity>(provider: &str, entities: Vec<E>) -> Snapshot<E> {
        let mut snapshot = Snapshot::new(provider);
        snapshot.load(entities);
        snapshot
    }

    fn pair() -> ProviderPair {
        ProviderPair::new("Src", "Dest")
    }

    #[tokio::test]
    async fn test_revalidate_policy_rejects_stale_mapping() {
        let provider = FakeProvider {
            albums: vec![
                album("stale", "Something Else", "Radiohead"),
                album("d-kid-a", "Kid A", "Radiohead"),
            ],
            ..Default::default()
        };
        let source = snapshot("Src", vec![album("s1", "Kid A", "Radiohead")]);
        let mut destination = snapshot::<Album>("Dest", Vec::new());
        let mut mappings = MappingStore::new();
        mappings.add(EntityKind::Album, &pair(), "s1", "stale").unwrap();

        let engine = ReconciliationEngine::new(ScriptedPrompt::answering(&[]))
            .with_policy(MappingPolicy::Revalidate);
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.stats.matched, 1);
        assert_eq!(job.stats.restored, 0);
        assert_eq!(destination.get(0).unwrap().id(), "d-kid-a");
        assert_eq!(
            mappings.find(EntityKind::Album, &pair(), "s1").unwrap().as_deref(),
            Some("d-kid-a")
        );
        assert!(provider.calls().contains(&"search_album:Radiohead - Kid A".to_string()));
    }

    #[tokio::test]
    async fn test_trust_policy_accepts_mapping_without_checking_name() {
        let provider = FakeProvider {
            albums: vec![album("stale", "Something Else", "Radiohead")],
            ..Default::default()
        };
        let source = snapshot("Src", vec![album("s1", "Kid A", "Radiohead")]);
        let mut destination = snapshot::<Album>("Dest", Vec::new());
        let mut mappings = MappingStore::new();
        mappings.add(EntityKind::Album, &pair(), "s1", "stale").unwrap();

        let engine = ReconciliationEngine::new(ScriptedPrompt::answering(&[]));
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.stats.restored, 1);
        assert_eq!(destination.get(0).unwrap().id(), "stale");
        assert!(destination.get(0).unwrap().is_dirty());
    }

    #[tokio::test]
    async fn test_search_failure_falls_through_to_prompt() {
        let provider = FakeProvider {
            failing_search: true,
            artists: vec![artist("d-7", "Portishead")],
            ..Default::default()
        };
        let prompt = ScriptedPrompt::answering(&[Some(" d-7 ")]);
        let source = snapshot("Src", vec![artist("s1", "Portishead")]);
        let mut destination = snapshot::<Artist>("Dest", Vec::new());
        let mut mappings = MappingStore::new();

        let engine = ReconciliationEngine::new(prompt.clone());
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.status, TransferStatus::Completed);
        assert_eq!(job.stats.manual, 1);
        assert_eq!(destination.len(), 1);

        let asked = prompt.asked();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, "Artist not found on Dest");
        assert!(asked[0].1.starts_with("Artist NOT FOUND!\nPortishead\n"));
        assert!(asked[0].1.contains("https://dest.example/search/Portishead"));
        assert_eq!(asked[0].2, "(Paste Artist id here)");
    }

    #[tokio::test]
    async fn test_unknown_manual_id_prompts_again() {
        let provider = FakeProvider {
            artists: vec![artist("d-2", "Tricky")],
            failing_search: true,
            ..Default::default()
        };
        let prompt = ScriptedPrompt::answering(&[Some("nope"), Some("d-2")]);
        let source = snapshot("Src", vec![artist("s2", "Tricky")]);
        let mut destination = snapshot::<Artist>("Dest", Vec::new());
        let mut mappings = MappingStore::new();

        let engine = ReconciliationEngine::new(prompt.clone());
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.stats.manual, 1);
        let asked = prompt.asked();
        assert_eq!(asked.len(), 2);
        assert!(asked[1].1.starts_with("No artist with id 'nope' on Dest."));
        assert_eq!(destination.get(0).unwrap().id(), "d-2");
        assert_eq!(
            mappings.find(EntityKind::Artist, &pair(), "s2").unwrap().as_deref(),
            Some("d-2")
        );
    }

    #[tokio::test]
    async fn test_empty_catalog_completes() {
        let provider = FakeProvider::default();
        let source = snapshot::<Artist>("Src", Vec::new());
        let mut destination = snapshot::<Artist>("Dest", Vec::new());
        let mut mappings = MappingStore::new();

        let engine = ReconciliationEngine::new(ScriptedPrompt::answering(&[]));
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(job.status, TransferStatus::Completed);
        assert_eq!(job.stats, TransferStats::default());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_before_first_entity() {
        let provider = FakeProvider::default();
        let source = snapshot("Src", vec![artist("s1", "Björk")]);
        let mut destination = snapshot::<Artist>("Dest", Vec::new());
        let mut mappings = MappingStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let engine = ReconciliationEngine::new(ScriptedPrompt::answering(&[]));
        let job = engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &cancel)
            .await
            .unwrap();

        assert_eq!(job.status, TransferStatus::Aborted);
        assert_eq!(job.stats.processed, 0);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_events_follow_the_run() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let provider = FakeProvider::default();
        let source = snapshot("Src", vec![artist("s1", "Air")]);
        let mut destination = snapshot("Dest", vec![artist("d1", "Air")]);
        let mut mappings = MappingStore::new();

        let engine = ReconciliationEngine::new(ScriptedPrompt::answering(&[])).with_event_bus(bus);
        engine
            .transfer(&source, &mut destination, &provider, &mut mappings, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Transfer(TransferEvent::Started { total: 1, .. })
        ));
        match events.recv().await.unwrap() {
            CoreEvent::Transfer(TransferEvent::ItemResolved { name, resolution, .. }) => {
                assert_eq!(name, "Air");
                assert_eq!(resolution, "already_present");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Transfer(TransferEvent::Completed { processed: 1, transferred: 0, .. })
        ));
    }
}
