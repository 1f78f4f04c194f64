//! UseCase: パーティ退出・切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeavePartyUseCase::leave()：明示的な退出（即時にロスターから削除）
//! - LeavePartyUseCase::disconnect()：接続断（再接続猶予の間はロスターに残す）
//!
//! ### どのような状況を想定しているか
//! - host の退出による co-host への引き継ぎ
//! - 切断後もロスターに残り、ロールが維持されること

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ParticipantId},
    hub::{HubManager, LeaveOutcome, PartyHub},
};

/// パーティ退出のユースケース
pub struct LeavePartyUseCase {
    manager: HubManager,
}

impl LeavePartyUseCase {
    /// 新しい LeavePartyUseCase を作成
    pub fn new(manager: HubManager) -> Self {
        Self { manager }
    }

    /// 明示的な退出（クライアントが Close を送った場合）
    ///
    /// 既に新しい接続に置き換えられた古い接続からの Close は無視します。
    ///
    /// # Returns
    ///
    /// 退出しなかった場合は `None`
    pub async fn leave(
        &self,
        hub: &Arc<PartyHub>,
        participant_id: &ParticipantId,
        connection_id: ConnectionId,
    ) -> Option<LeaveOutcome> {
        self.manager
            .leave(hub, participant_id, connection_id)
            .await
    }

    /// 接続断（読み書きの失敗・無応答）
    ///
    /// 再接続猶予を過ぎても戻らなければ退出として扱われます。
    pub async fn disconnect(
        &self,
        hub: &Arc<PartyHub>,
        participant_id: &ParticipantId,
        connection_id: ConnectionId,
    ) {
        self.manager
            .disconnect(hub, participant_id, connection_id)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::SystemClock,
        config::HubSettings,
        domain::{Command, PartyId, Role},
        infrastructure::repository::InMemoryPartyRepository,
    };

    fn party() -> PartyId {
        PartyId::new("party-1".to_string()).unwrap()
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id.to_string()).unwrap()
    }

    fn create_manager() -> HubManager {
        HubManager::new(
            Arc::new(InMemoryPartyRepository::new(true)),
            Arc::new(SystemClock),
            HubSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_host_leave_hands_over_to_co_host() {
        // テスト項目: host が退出すると co-host が host になり、再生操作ができる
        // given (前提条件):
        let manager = create_manager();
        let (hub, host) = manager.join(&party(), pid("host"), Role::Host).await.unwrap();
        let (_, _co) = manager.join(&party(), pid("co"), Role::CoHost).await.unwrap();
        let usecase = LeavePartyUseCase::new(manager);

        // when (操作):
        let outcome = usecase
            .leave(&hub, &pid("host"), host.connection_id)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.new_host, Some(pid("co")));
        let events = hub.handle_command(&pid("co"), Command::Play).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_unknown_participant() {
        // テスト項目: ロスターにいない参加者の退出は None を返す
        let manager = create_manager();
        let (hub, host) = manager.join(&party(), pid("host"), Role::Host).await.unwrap();
        let usecase = LeavePartyUseCase::new(manager);

        assert!(
            usecase
                .leave(&hub, &pid("nobody"), host.connection_id)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_close_from_superseded_connection_is_ignored() {
        // テスト項目: 置き換え済みの古い接続からの Close では退出しない
        // given (前提条件):
        let manager = create_manager();
        let (hub, first) = manager.join(&party(), pid("host"), Role::Host).await.unwrap();
        let (_, _second) = manager.join(&party(), pid("host"), Role::Host).await.unwrap();
        let usecase = LeavePartyUseCase::new(manager);

        // when (操作):
        let outcome = usecase.leave(&hub, &pid("host"), first.connection_id).await;

        // then (期待する結果):
        assert!(outcome.is_none());
        let summary = hub.summary().await;
        assert_eq!(summary.participants.len(), 1);
        assert!(summary.participants[0].connected);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_participant_in_roster() {
        // テスト項目: 切断しても猶予中はロスターに残り、切断状態として表示される
        // given (前提条件):
        let manager = create_manager();
        let (hub, host) = manager.join(&party(), pid("host"), Role::Host).await.unwrap();
        let usecase = LeavePartyUseCase::new(manager);

        // when (操作):
        usecase.disconnect(&hub, &pid("host"), host.connection_id).await;

        // then (期待する結果):
        let summary = hub.summary().await;
        assert_eq!(summary.participants.len(), 1);
        assert!(!summary.participants[0].connected);
        assert_eq!(summary.participants[0].role, Role::Host);
        assert_eq!(summary.live_connections, 0);
    }
}
