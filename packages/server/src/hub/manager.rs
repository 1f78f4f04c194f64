//! Process-wide registry of live party hubs.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use super::{
    error::HubError,
    party_hub::{JoinedSession, LeaveOutcome, PartyHub, PartySummary},
    persister::spawn_persister,
};
use crate::{
    common::Clock,
    config::HubSettings,
    domain::{ConnectionId, ParticipantId, Party, PartyId, PartyRepository, PlaybackState, Role},
};

type HubCell = Arc<OnceCell<Arc<PartyHub>>>;

/// Maps each party id to at most one live hub.
#[derive(Clone)]
pub struct HubManager {
    hubs: Arc<Mutex<HashMap<PartyId, HubCell>>>,
    repository: Arc<dyn PartyRepository>,
    clock: Arc<dyn Clock>,
    settings: Arc<HubSettings>,
}

impl HubManager {
    pub fn new(
        repository: Arc<dyn PartyRepository>,
        clock: Arc<dyn Clock>,
        settings: HubSettings,
    ) -> Self {
        Self {
            hubs: Arc::new(Mutex::new(HashMap::new())),
            repository,
            clock,
            settings: Arc::new(settings),
        }
    }

    pub fn repository(&self) -> &Arc<dyn PartyRepository> {
        &self.repository
    }

    /// Return the live hub for `party_id`, creating it from the stored record.
    ///
    /// Concurrent callers for the same party share one creation.
    ///
    /// # Errors
    ///
    /// * `HubError::PartyNotFound` - no record for the party
    /// * `HubError::PartyEnded` - the record is marked ended
    /// * `HubError::Repository` - the lookup itself failed
    pub async fn get_or_create(&self, party_id: &PartyId) -> Result<Arc<PartyHub>, HubError> {
        let cell = {
            let mut hubs = self.hubs.lock().await;
            hubs.entry(party_id.clone()).or_default().clone()
        };

        let result = cell
            .get_or_try_init(|| self.load_hub(party_id))
            .await
            .cloned();

        if result.is_err() {
            // Let the next caller retry from scratch.
            let mut hubs = self.hubs.lock().await;
            if let Some(current) = hubs.get(party_id) {
                if Arc::ptr_eq(current, &cell) && current.get().is_none() {
                    hubs.remove(party_id);
                }
            }
        }
        result
    }

    async fn load_hub(&self, party_id: &PartyId) -> Result<Arc<PartyHub>, HubError> {
        let record = self
            .repository
            .find_party(party_id)
            .await?
            .ok_or_else(|| HubError::PartyNotFound(party_id.to_string()))?;
        if record.ended {
            return Err(HubError::PartyEnded);
        }

        let restored = record.playback.is_some();
        let playback = record
            .playback
            .unwrap_or_else(|| PlaybackState::paused_at_start(self.clock.now()));
        let capacity = record
            .max_participants
            .unwrap_or(self.settings.max_participants);
        let party = Party::new(party_id.clone(), playback, capacity);

        let hub = Arc::new(PartyHub::new(
            party,
            self.clock.clone(),
            self.settings.outbound_capacity,
        ));
        spawn_persister(
            party_id.clone(),
            hub.subscribe_snapshots(),
            self.repository.clone(),
        );

        tracing::info!(
            "Hub for party '{}' created (capacity: {}, restored: {})",
            party_id,
            capacity,
            restored
        );
        Ok(hub)
    }

    /// Live hub for `party_id`, if one is running.
    pub async fn lookup(&self, party_id: &PartyId) -> Option<Arc<PartyHub>> {
        let hubs = self.hubs.lock().await;
        hubs.get(party_id).and_then(|cell| cell.get().cloned())
    }

    /// Join the party's hub, creating it if needed.
    ///
    /// A join that lands on a hub closing for idleness retries once on a
    /// fresh hub.
    pub async fn join(
        &self,
        party_id: &PartyId,
        participant: ParticipantId,
        role: Role,
    ) -> Result<(Arc<PartyHub>, JoinedSession), HubError> {
        let mut retried = false;
        loop {
            let hub = self.get_or_create(party_id).await?;
            match hub.handle_join(participant.clone(), role).await {
                Ok(session) => return Ok((hub, session)),
                Err(HubError::PartyEnded) if !retried => {
                    tracing::debug!(
                        "Hub for party '{}' closed during join, retrying",
                        party_id
                    );
                    self.remove_hub(party_id, &hub).await;
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A connection dropped. Evict the participant if they do not return
    /// within the reconnect window.
    pub async fn disconnect(
        &self,
        hub: &Arc<PartyHub>,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) {
        if !hub.handle_disconnect(participant, connection).await {
            return;
        }

        let manager = self.clone();
        let hub = hub.clone();
        let participant = participant.clone();
        let window = self.settings.reconnect_window();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(outcome) = hub.evict_if_disconnected(&participant, connection).await {
                if outcome.roster_empty {
                    manager.release_if_empty(&hub).await;
                }
            }
        });
    }

    /// Explicit leave from `connection`: remove the participant now, unless
    /// a reconnect already replaced that connection.
    pub async fn leave(
        &self,
        hub: &Arc<PartyHub>,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> Option<LeaveOutcome> {
        let outcome = hub.handle_leave_connection(participant, connection).await?;
        if outcome.roster_empty {
            self.release_if_empty(hub).await;
        }
        Some(outcome)
    }

    /// Tear the hub down after the idle grace if nobody joined meanwhile.
    pub async fn release_if_empty(&self, hub: &Arc<PartyHub>) {
        let epoch = hub.activity_epoch().await;
        let manager = self.clone();
        let hub = hub.clone();
        let grace = self.settings.idle_grace();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if hub.close_if_idle(epoch).await {
                manager.remove_hub(hub.party_id(), &hub).await;
                tracing::info!("Hub for party '{}' released after idle grace", hub.party_id());
            }
        });
    }

    /// End a party: persist the fact, notify every connection, drop the hub.
    pub async fn end_party(&self, party_id: &PartyId) -> Result<(), HubError> {
        self.repository.mark_ended(party_id).await?;
        let cell = self.hubs.lock().await.remove(party_id);
        if let Some(hub) = cell.and_then(|cell| cell.get().cloned()) {
            hub.shutdown(true).await;
        }
        tracing::info!("Party '{}' ended", party_id);
        Ok(())
    }

    /// Close every hub; used on server shutdown.
    pub async fn shutdown_all(&self) {
        let cells: Vec<HubCell> = self.hubs.lock().await.drain().map(|(_, cell)| cell).collect();
        let count = cells.len();
        for cell in cells {
            if let Some(hub) = cell.get() {
                hub.shutdown(false).await;
            }
        }
        tracing::info!("Closed {} hub(s)", count);
    }

    pub async fn summaries(&self) -> Vec<PartySummary> {
        let hubs: Vec<Arc<PartyHub>> = {
            let hubs = self.hubs.lock().await;
            hubs.values().filter_map(|cell| cell.get().cloned()).collect()
        };
        let mut summaries = Vec::with_capacity(hubs.len());
        for hub in hubs {
            if !hub.is_closed().await {
                summaries.push(hub.summary().await);
            }
        }
        summaries.sort_by(|a, b| a.party_id.as_str().cmp(b.party_id.as_str()));
        summaries
    }

    pub async fn summary(&self, party_id: &PartyId) -> Option<PartySummary> {
        let hub = self.lookup(party_id).await?;
        if hub.is_closed().await {
            return None;
        }
        Some(hub.summary().await)
    }

    pub async fn live_count(&self) -> usize {
        self.hubs.lock().await.len()
    }

    /// Remove the registry entry only if it still points at `hub`.
    async fn remove_hub(&self, party_id: &PartyId, hub: &Arc<PartyHub>) {
        let mut hubs = self.hubs.lock().await;
        let is_same = hubs
            .get(party_id)
            .and_then(|cell| cell.get())
            .is_some_and(|current| Arc::ptr_eq(current, hub));
        if is_same {
            hubs.remove(party_id);
        }
    }
}
