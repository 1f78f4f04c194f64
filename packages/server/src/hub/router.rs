//! Fan-out of events to the live connections of one party.

use std::collections::HashMap;

use super::outbound::{OutboundSender, PushOutcome};
use crate::domain::{ConnectionId, Event, ParticipantId};

struct Registration {
    connection: ConnectionId,
    sender: OutboundSender,
}

/// Routes events to every registered connection.
///
/// Pushing never waits, so a stalled receiver cannot hold up the others;
/// its own queue absorbs the backlog under the overflow policy.
#[derive(Default)]
pub struct BroadcastRouter {
    registrations: HashMap<ParticipantId, Registration>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, closing any connection it supersedes.
    pub fn register(
        &mut self,
        participant: ParticipantId,
        connection: ConnectionId,
        sender: OutboundSender,
    ) {
        if let Some(previous) = self.registrations.insert(
            participant.clone(),
            Registration { connection, sender },
        ) {
            tracing::info!(
                "Connection {} of '{}' superseded by {}",
                previous.connection,
                participant,
                connection
            );
            previous.sender.close();
        }
    }

    /// Remove the registration if `connection` is still the current one.
    pub fn unregister(&mut self, participant: &ParticipantId, connection: ConnectionId) -> bool {
        match self.registrations.get(participant) {
            Some(reg) if reg.connection == connection => {
                if let Some(reg) = self.registrations.remove(participant) {
                    reg.sender.close();
                }
                true
            }
            _ => false,
        }
    }

    /// Remove whatever connection the participant has.
    pub fn remove(&mut self, participant: &ParticipantId) {
        if let Some(reg) = self.registrations.remove(participant) {
            reg.sender.close();
        }
    }

    pub fn publish(&mut self, event: &Event) {
        self.fan_out(event, None);
    }

    pub fn publish_except(&mut self, event: &Event, except: &ParticipantId) {
        self.fan_out(event, Some(except));
    }

    /// Deliver to one participant only. Returns false if they have no live connection.
    pub fn send_to(&mut self, participant: &ParticipantId, event: Event) -> bool {
        let Some(reg) = self.registrations.get(participant) else {
            return false;
        };
        match reg.sender.push(event) {
            Ok(outcome) => {
                log_overflow(participant, outcome);
                true
            }
            Err(_) => {
                tracing::debug!("Pruning closed connection of '{}'", participant);
                self.registrations.remove(participant);
                false
            }
        }
    }

    /// Deliver to `participant` only while `connection` is their registered one.
    pub fn send_to_connection(
        &mut self,
        participant: &ParticipantId,
        connection: ConnectionId,
        event: Event,
    ) -> bool {
        match self.registrations.get(participant) {
            Some(reg) if reg.connection == connection => self.send_to(participant, event),
            _ => false,
        }
    }

    /// Close every connection; their writer loops end after draining.
    pub fn close_all(&mut self) {
        for (_, reg) in self.registrations.drain() {
            reg.sender.close();
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn fan_out(&mut self, event: &Event, except: Option<&ParticipantId>) {
        let mut closed = Vec::new();
        for (participant, reg) in &self.registrations {
            if Some(participant) == except {
                continue;
            }
            match reg.sender.push(event.clone()) {
                Ok(outcome) => log_overflow(participant, outcome),
                Err(_) => closed.push(participant.clone()),
            }
        }
        for participant in closed {
            tracing::debug!("Pruning closed connection of '{}'", participant);
            self.registrations.remove(&participant);
        }
    }
}

fn log_overflow(participant: &ParticipantId, outcome: PushOutcome) {
    if let PushOutcome::Overflowed { evicted } = outcome {
        tracing::warn!(
            "Outbound queue of '{}' overflowed, evicted {} event(s)",
            participant,
            evicted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{EventKind, PartyId, PlaybackView, Position, Timestamp},
        hub::outbound::channel,
    };

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id.to_string()).unwrap()
    }

    fn event(at: i64) -> Event {
        Event::playback(
            EventKind::Play,
            PartyId::new("party-1".to_string()).unwrap(),
            PlaybackView {
                clip_id: None,
                position: Position::ZERO,
                is_playing: true,
            },
            Timestamp::new(at),
        )
    }

    #[tokio::test]
    async fn test_publish_reaches_every_connection() {
        // テスト項目: publish は登録された全ての接続に届く
        // given (前提条件):
        let mut router = BroadcastRouter::new();
        let (tx_a, mut rx_a) = channel(4);
        let (tx_b, mut rx_b) = channel(4);
        router.register(pid("alice"), ConnectionId::new(1), tx_a);
        router.register(pid("bob"), ConnectionId::new(2), tx_b);

        // when (操作):
        router.publish(&event(1));

        // then (期待する結果):
        assert_eq!(rx_a.recv().await.unwrap().server_timestamp, Timestamp::new(1));
        assert_eq!(rx_b.recv().await.unwrap().server_timestamp, Timestamp::new(1));
    }

    #[tokio::test]
    async fn test_full_receiver_does_not_block_others() {
        // テスト項目: 受信が滞った接続があっても他の接続への配送は止まらない
        // given (前提条件):
        let mut router = BroadcastRouter::new();
        let (tx_slow, rx_slow) = channel(1);
        let (tx_fast, mut rx_fast) = channel(16);
        router.register(pid("slow"), ConnectionId::new(1), tx_slow);
        router.register(pid("fast"), ConnectionId::new(2), tx_fast);

        // when (操作):
        for i in 0..10 {
            router.publish(&event(i));
        }

        // then (期待する結果):
        assert_eq!(rx_slow.len(), 1);
        for i in 0..10 {
            assert_eq!(rx_fast.recv().await.unwrap().server_timestamp, Timestamp::new(i));
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        // テスト項目: 受信側が破棄された接続は配送時に取り除かれる
        let mut router = BroadcastRouter::new();
        let (tx, rx) = channel(4);
        router.register(pid("alice"), ConnectionId::new(1), tx);
        drop(rx);

        router.publish(&event(1));

        assert!(router.is_empty());
    }

    #[tokio::test]
    async fn test_register_supersedes_previous_connection() {
        // テスト項目: 同じ参加者の新しい接続は古い接続を閉じる
        // given (前提条件):
        let mut router = BroadcastRouter::new();
        let (tx_old, mut rx_old) = channel(4);
        let (tx_new, _rx_new) = channel(4);
        router.register(pid("alice"), ConnectionId::new(1), tx_old);

        // when (操作):
        router.register(pid("alice"), ConnectionId::new(2), tx_new);

        // then (期待する結果):
        assert!(rx_old.recv().await.is_none());
        assert_eq!(router.len(), 1);
        assert!(!router.unregister(&pid("alice"), ConnectionId::new(1)));
        assert!(router.unregister(&pid("alice"), ConnectionId::new(2)));
    }

    #[tokio::test]
    async fn test_publish_except_skips_origin() {
        // テスト項目: publish_except は指定した参加者を除外する
        let mut router = BroadcastRouter::new();
        let (tx_a, rx_a) = channel(4);
        let (tx_b, rx_b) = channel(4);
        router.register(pid("alice"), ConnectionId::new(1), tx_a);
        router.register(pid("bob"), ConnectionId::new(2), tx_b);

        router.publish_except(&event(1), &pid("alice"));

        assert!(rx_a.is_empty());
        assert_eq!(rx_b.len(), 1);
    }

    #[tokio::test]
    async fn test_send_to_connection_ignores_superseded_connection() {
        // テスト項目: 置き換え済みの接続宛てのイベントは新しい接続に届かない
        // given (前提条件):
        let mut router = BroadcastRouter::new();
        let (tx_old, _rx_old) = channel(4);
        let (tx_new, rx_new) = channel(4);
        router.register(pid("alice"), ConnectionId::new(1), tx_old);
        router.register(pid("alice"), ConnectionId::new(2), tx_new);

        // when (操作):
        let to_old = router.send_to_connection(&pid("alice"), ConnectionId::new(1), event(1));
        let to_new = router.send_to_connection(&pid("alice"), ConnectionId::new(2), event(2));

        // then (期待する結果):
        assert!(!to_old);
        assert!(to_new);
        assert_eq!(rx_new.len(), 1);
    }
}
