//! UseCase: パーティ参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinPartyUseCase::execute() メソッド
//! - ロールの解決（リポジトリ）とハブへの参加
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済み参加者の参加、最初のフレームが sync であること
//! - 異常系：未登録の参加者、存在しないパーティ、満員のパーティ
//! - 未登録の参加者が作らせたハブが猶予後に破棄されること

use std::sync::Arc;

use crate::{
    domain::{ParticipantId, PartyId},
    hub::{HubManager, JoinedSession, PartyHub},
};

use super::error::UseCaseError;

/// パーティ参加のユースケース
pub struct JoinPartyUseCase {
    manager: HubManager,
}

impl JoinPartyUseCase {
    /// 新しい JoinPartyUseCase を作成
    pub fn new(manager: HubManager) -> Self {
        Self { manager }
    }

    /// パーティ参加を実行
    ///
    /// 認証済みのロールをリポジトリから取得し、ハブに接続を登録します。
    ///
    /// # Returns
    ///
    /// * `Ok((hub, session))` - 参加成功。`session.receiver` の先頭には sync が入っている
    /// * `Err(UseCaseError)` - 参加失敗
    pub async fn execute(
        &self,
        party_id: &PartyId,
        participant_id: ParticipantId,
    ) -> Result<(Arc<PartyHub>, JoinedSession), UseCaseError> {
        // 1. パーティの存在確認（終了済みならここで弾く）
        let hub = self.manager.get_or_create(party_id).await?;

        // 2. ロールの解決（失敗したら、空のハブを猶予後に片付ける）
        let role = match self
            .manager
            .repository()
            .find_member_role(party_id, &participant_id)
            .await
        {
            Ok(Some(role)) => role,
            Ok(None) => {
                self.manager.release_if_empty(&hub).await;
                return Err(UseCaseError::NotParticipant(participant_id.to_string()));
            }
            Err(e) => {
                self.manager.release_if_empty(&hub).await;
                return Err(e.into());
            }
        };

        // 3. ハブへ参加
        let joined = self.manager.join(party_id, participant_id, role).await?;
        Ok(joined)
    }
}
