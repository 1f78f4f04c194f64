//! Asynchronous write-behind of playback snapshots.
//!
//! The hub publishes every new state on a `watch` channel and never waits on
//! storage. This task saves whatever the latest snapshot is; intermediate
//! states may be skipped.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::domain::{PartyId, PartyRepository, PlaybackState};

pub fn spawn_persister(
    party_id: PartyId,
    mut snapshots: watch::Receiver<PlaybackState>,
    repository: Arc<dyn PartyRepository>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Ends once the hub (the sender) is dropped.
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if let Err(e) = repository.save_playback(&party_id, snapshot).await {
                tracing::warn!("Failed to persist playback of party '{}': {}", party_id, e);
            }
        }
        tracing::debug!("Persister for party '{}' stopped", party_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Position, RepositoryError, Timestamp, repository::MockPartyRepository};
    use std::time::Duration;

    fn party() -> PartyId {
        PartyId::new("party-1".to_string()).unwrap()
    }

    fn state_at(position: f64) -> PlaybackState {
        PlaybackState {
            clip_id: None,
            position: Position::new(position).unwrap(),
            is_playing: false,
            updated_at: Timestamp::new(0),
        }
    }

    #[tokio::test]
    async fn test_persister_saves_latest_snapshot() {
        // テスト項目: 最新のスナップショットがリポジトリに保存される
        // given (前提条件):
        let (tx, rx) = watch::channel(state_at(0.0));
        let (saved_tx, mut saved_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut mock = MockPartyRepository::new();
        mock.expect_save_playback().returning(move |_, playback| {
            let _ = saved_tx.send(playback);
            Ok(())
        });
        let handle = spawn_persister(party(), rx, Arc::new(mock));

        // when (操作):
        tx.send_replace(state_at(12.0));

        // then (期待する結果):
        let saved = tokio::time::timeout(Duration::from_secs(1), saved_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.position.seconds(), 12.0);

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_persister_survives_repository_failure() {
        // テスト項目: 保存に失敗しても次のスナップショットの保存を続ける
        // given (前提条件):
        let (tx, rx) = watch::channel(state_at(0.0));
        let (saved_tx, mut saved_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut mock = MockPartyRepository::new();
        let mut calls = 0;
        mock.expect_save_playback().returning(move |_, playback| {
            calls += 1;
            let _ = saved_tx.send(playback);
            if calls == 1 {
                Err(RepositoryError::Unavailable("down".to_string()))
            } else {
                Ok(())
            }
        });
        let _handle = spawn_persister(party(), rx, Arc::new(mock));

        // when (操作):
        tx.send_replace(state_at(1.0));
        let first = tokio::time::timeout(Duration::from_secs(1), saved_rx.recv())
            .await
            .unwrap()
            .unwrap();
        tx.send_replace(state_at(2.0));

        // then (期待する結果):
        let second = tokio::time::timeout(Duration::from_secs(1), saved_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.position.seconds(), 1.0);
        assert_eq!(second.position.seconds(), 2.0);
    }
}
