//! One party's hub: the single writer of its playback state and roster.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use super::{
    error::HubError,
    outbound::{self, OutboundReceiver},
    router::BroadcastRouter,
};
use crate::{
    common::Clock,
    domain::{
        Admission, Command, ConnectionId, ErrorCode, Event, EventKind, Outcome, ParticipantId,
        ParticipantView, Party, PartyId, PlaybackState, PlaybackView, Role, Roster, Timestamp,
        process,
    },
};

/// A live connection handed back from a successful join.
///
/// The receiver already holds the join snapshot as its first event.
pub struct JoinedSession {
    pub connection_id: ConnectionId,
    /// Role after admission (may differ from the claimed one)
    pub role: Role,
    /// `sync` snapshot with the roster, as queued for this connection
    pub snapshot: Event,
    pub receiver: OutboundReceiver,
}

/// Result of removing a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub new_host: Option<ParticipantId>,
    pub roster_empty: bool,
}

/// Read-only view used by the HTTP endpoints.
#[derive(Debug, Clone)]
pub struct PartySummary {
    pub party_id: PartyId,
    pub playback: PlaybackView,
    pub participants: Vec<ParticipantView>,
    pub live_connections: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HubStatus {
    Active,
    Closed,
}

struct HubInner {
    party: Party,
    router: BroadcastRouter,
    status: HubStatus,
    next_connection: u64,
    /// Bumped on every join; guards idle teardown against late joiners.
    activity_epoch: u64,
}

pub struct PartyHub {
    party_id: PartyId,
    inner: Mutex<HubInner>,
    clock: Arc<dyn Clock>,
    outbound_capacity: usize,
    snapshots: watch::Sender<PlaybackState>,
}

fn roster_views(roster: &Roster) -> Vec<ParticipantView> {
    roster.participants().iter().map(ParticipantView::from).collect()
}

impl PartyHub {
    pub fn new(party: Party, clock: Arc<dyn Clock>, outbound_capacity: usize) -> Self {
        let (snapshots, _) = watch::channel(party.playback.clone());
        Self {
            party_id: party.id.clone(),
            inner: Mutex::new(HubInner {
                party,
                router: BroadcastRouter::new(),
                status: HubStatus::Active,
                next_connection: 1,
                activity_epoch: 0,
            }),
            clock,
            outbound_capacity,
            snapshots,
        }
    }

    pub fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    /// Playback snapshots published after every applied mutation.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlaybackState> {
        self.snapshots.subscribe()
    }

    /// Register a connection for `participant` and queue the current state.
    ///
    /// # Errors
    ///
    /// * `HubError::PartyEnded` - the hub has been torn down
    /// * `HubError::PartyFull` - a newcomer would exceed the roster cap
    pub async fn handle_join(
        &self,
        participant: ParticipantId,
        claimed_role: Role,
    ) -> Result<JoinedSession, HubError> {
        let mut inner = self.inner.lock().await;
        if inner.status == HubStatus::Closed {
            return Err(HubError::PartyEnded);
        }

        let now = self.clock.now();
        let view = inner
            .party
            .playback
            .view_at(now)
            .map_err(|e| HubError::Internal(e.to_string()))?;

        let connection_id = ConnectionId::new(inner.next_connection);
        let admitted =
            inner
                .party
                .roster
                .admit(participant.clone(), claimed_role, connection_id, now)?;
        inner.next_connection += 1;
        inner.activity_epoch += 1;

        let roster = roster_views(&inner.party.roster);
        let snapshot = Event::playback(EventKind::Sync, self.party_id.clone(), view.clone(), now)
            .with_roster(roster.clone());

        // Queue the snapshot before registering so it precedes any broadcast.
        let (sender, receiver) = outbound::channel(self.outbound_capacity);
        sender
            .push(snapshot.clone())
            .map_err(|e| HubError::Internal(e.to_string()))?;
        inner.router.register(participant.clone(), connection_id, sender);

        match admitted.admission {
            Admission::Joined => {
                if let Some(joined) = inner.party.roster.get(&participant) {
                    let event = Event::participant(
                        EventKind::ParticipantJoined,
                        self.party_id.clone(),
                        view,
                        ParticipantView::from(joined),
                        roster,
                        now,
                    );
                    inner.router.publish_except(&event, &participant);
                }
                tracing::info!(
                    "'{}' joined party '{}' as {} ({})",
                    participant,
                    self.party_id,
                    admitted.role,
                    connection_id
                );
            }
            Admission::Reconnected { previous } => {
                self.publish_presence(&mut inner, now, Some(&participant));
                tracing::info!(
                    "'{}' reconnected to party '{}' ({}, previous: {:?})",
                    participant,
                    self.party_id,
                    connection_id,
                    previous
                );
            }
        }
        if let Some(promoted) = &admitted.promoted {
            tracing::info!("'{}' promoted to host of party '{}'", promoted, self.party_id);
        }

        Ok(JoinedSession {
            connection_id,
            role: admitted.role,
            snapshot,
            receiver,
        })
    }

    /// Validate and apply one command.
    ///
    /// The caller's role is read from the roster under the same lock that
    /// host reassignment takes, so a command never sees a stale role.
    /// Returns the events produced; unauthorized commands yield none.
    ///
    /// # Errors
    ///
    /// * `HubError::PartyEnded` - the hub has been torn down
    /// * `HubError::Internal` - the processor faulted; state is unchanged
    pub async fn handle_command(
        &self,
        participant: &ParticipantId,
        command: Command,
    ) -> Result<Vec<Event>, HubError> {
        let mut inner = self.inner.lock().await;
        if inner.status == HubStatus::Closed {
            return Err(HubError::PartyEnded);
        }

        let Some(role) = inner.party.roster.get(participant).map(|p| p.role) else {
            tracing::debug!(
                "Ignoring {:?} from '{}': not in roster of '{}'",
                command.kind(),
                participant,
                self.party_id
            );
            return Ok(Vec::new());
        };

        let now = self.clock.now();
        match process(&self.party_id, &inner.party.playback, role, &command, now) {
            Ok(Outcome::Apply { state, event }) => {
                let event = event.with_roster(roster_views(&inner.party.roster));
                inner.party.playback = state.clone();
                inner.router.publish(&event);
                self.snapshots.send_replace(state);
                tracing::debug!(
                    "Party '{}': {:?} by '{}' applied",
                    self.party_id,
                    event.kind,
                    participant
                );
                Ok(vec![event])
            }
            Ok(Outcome::Reply(event)) => {
                let event = event.with_roster(roster_views(&inner.party.roster));
                inner.router.send_to(participant, event.clone());
                Ok(vec![event])
            }
            Ok(Outcome::Dropped) => {
                tracing::debug!(
                    "Party '{}': dropped unauthorized {:?} from '{}' ({})",
                    self.party_id,
                    command.kind(),
                    participant,
                    role
                );
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::error!(
                    "Party '{}': {:?} from '{}' failed: {}",
                    self.party_id,
                    command.kind(),
                    participant,
                    e
                );
                Err(HubError::Internal(e.to_string()))
            }
        }
    }

    /// Queue an event on one specific connection, behind whatever it already
    /// holds. Returns false if that connection is no longer registered.
    pub async fn send_to_connection(
        &self,
        participant: &ParticipantId,
        connection: ConnectionId,
        event: Event,
    ) -> bool {
        self.inner
            .lock()
            .await
            .router
            .send_to_connection(participant, connection, event)
    }

    /// The connection went away; keep the participant as disconnected.
    ///
    /// Returns true if `connection` was the participant's live one.
    pub async fn handle_disconnect(
        &self,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        inner.router.unregister(participant, connection);
        let now = self.clock.now();
        let detached = inner.party.roster.detach(participant, connection, now);
        if detached {
            self.publish_presence(&mut inner, now, None);
            tracing::info!(
                "'{}' disconnected from party '{}' ({})",
                participant,
                self.party_id,
                connection
            );
        }
        detached
    }

    /// Explicit leave from `connection`: remove the participant, reassigning
    /// host atomically.
    ///
    /// The connection check and the removal happen under one lock, so a
    /// reconnect that already replaced `connection` is left alone.
    pub async fn handle_leave_connection(
        &self,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> Option<LeaveOutcome> {
        let mut inner = self.inner.lock().await;
        let current = inner
            .party
            .roster
            .get(participant)
            .and_then(|p| p.presence.connection());
        if current != Some(connection) {
            tracing::debug!(
                "Ignoring close of {} for '{}': not the live connection",
                connection,
                participant
            );
            return None;
        }
        self.leave_locked(&mut inner, participant)
    }

    /// Evict `participant` if they are still disconnected since losing `connection`.
    pub async fn evict_if_disconnected(
        &self,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> Option<LeaveOutcome> {
        let mut inner = self.inner.lock().await;
        if !inner.party.roster.is_disconnected_from(participant, connection) {
            return None;
        }
        tracing::info!(
            "Evicting '{}' from party '{}' after reconnect window",
            participant,
            self.party_id
        );
        self.leave_locked(&mut inner, participant)
    }

    /// Tell the roster about a presence change with a `sync` carrying the
    /// current roster.
    fn publish_presence(&self, inner: &mut HubInner, now: Timestamp, except: Option<&ParticipantId>) {
        let view = match inner.party.playback.view_at(now) {
            Ok(view) => view,
            Err(e) => {
                tracing::error!("Party '{}': cannot render state: {}", self.party_id, e);
                return;
            }
        };
        let event = Event::playback(EventKind::Sync, self.party_id.clone(), view, now)
            .with_roster(roster_views(&inner.party.roster));
        match except {
            Some(participant) => inner.router.publish_except(&event, participant),
            None => inner.router.publish(&event),
        }
    }

    fn leave_locked(&self, inner: &mut HubInner, participant: &ParticipantId) -> Option<LeaveOutcome> {
        inner.router.remove(participant);
        let removal = inner.party.roster.remove(participant)?;
        let now = self.clock.now();

        let mut left = ParticipantView::from(&removal.participant);
        left.connected = false;
        match inner.party.playback.view_at(now) {
            Ok(view) => {
                let event = Event::participant(
                    EventKind::ParticipantLeft,
                    self.party_id.clone(),
                    view,
                    left,
                    roster_views(&inner.party.roster),
                    now,
                );
                inner.router.publish(&event);
            }
            Err(e) => tracing::error!("Party '{}': cannot render state: {}", self.party_id, e),
        }

        tracing::info!("'{}' left party '{}'", participant, self.party_id);
        match &removal.new_host {
            Some(new_host) => {
                tracing::info!("'{}' is now host of party '{}'", new_host, self.party_id)
            }
            None if removal.participant.role == Role::Host => {
                tracing::info!("Party '{}' has no host left", self.party_id)
            }
            None => {}
        }

        Some(LeaveOutcome {
            new_host: removal.new_host,
            roster_empty: inner.party.roster.is_empty(),
        })
    }

    /// Join counter, read before scheduling an idle teardown.
    pub async fn activity_epoch(&self) -> u64 {
        self.inner.lock().await.activity_epoch
    }

    /// Close the hub if the roster is empty and nobody joined since `epoch`.
    pub async fn close_if_idle(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.status == HubStatus::Closed {
            return true;
        }
        if !inner.party.roster.is_empty() || inner.activity_epoch != epoch {
            return false;
        }
        inner.status = HubStatus::Closed;
        inner.router.close_all();
        true
    }

    /// Close the hub and every connection.
    ///
    /// With `ended`, each connection first receives a `PARTY_ENDED` error.
    pub async fn shutdown(&self, ended: bool) {
        let mut inner = self.inner.lock().await;
        if inner.status == HubStatus::Closed {
            return;
        }
        inner.status = HubStatus::Closed;
        if ended {
            let event = Event::error(
                self.party_id.clone(),
                ErrorCode::PartyEnded,
                "The watch party has ended",
                self.clock.now(),
            );
            inner.router.publish(&event);
        }
        inner.router.close_all();
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.status == HubStatus::Closed
    }

    pub async fn summary(&self) -> PartySummary {
        let inner = self.inner.lock().await;
        let now = self.clock.now();
        let playback = &inner.party.playback;
        PartySummary {
            party_id: self.party_id.clone(),
            playback: PlaybackView {
                clip_id: playback.clip_id.clone(),
                position: playback.effective_position(now).unwrap_or(playback.position),
                is_playing: playback.is_playing,
            },
            participants: roster_views(&inner.party.roster),
            live_connections: inner.router.len(),
            capacity: inner.party.roster.capacity(),
        }
    }
}
