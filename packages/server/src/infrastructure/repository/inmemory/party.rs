//! InMemory Party Repository 実装
//!
//! ドメイン層が定義する PartyRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! パーティの作成・招待・終了といったライフサイクルは本来外部のサービスが
//! 持つものですが、開発用サーバーではこのリポジトリがその代わりを務めます。
//! `auto_provision` を有効にすると、未知のパーティは参照時に作成され、
//! 未知の参加者は最初の 1 人が host、以降は viewer として登録されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ParticipantId, PartyId, PartyRecord, PartyRepository, PlaybackState, RepositoryError, Role,
};

/// 1 パーティ分の保存データ
struct StoredParty {
    record: PartyRecord,
    /// 参加者と付与済みロール（登録順）
    members: Vec<(ParticipantId, Role)>,
}

impl StoredParty {
    fn new(record: PartyRecord) -> Self {
        Self {
            record,
            members: Vec::new(),
        }
    }
}

/// インメモリ Party Repository 実装
pub struct InMemoryPartyRepository {
    parties: Mutex<HashMap<PartyId, StoredParty>>,
    /// 未知のパーティ・参加者を自動登録するか
    auto_provision: bool,
}

impl InMemoryPartyRepository {
    /// 新しい InMemoryPartyRepository を作成
    pub fn new(auto_provision: bool) -> Self {
        Self {
            parties: Mutex::new(HashMap::new()),
            auto_provision,
        }
    }

    /// パーティを登録（既存の場合は上書き）
    pub async fn insert_party(&self, record: PartyRecord) {
        let mut parties = self.parties.lock().await;
        parties.insert(record.id.clone(), StoredParty::new(record));
    }

    /// 参加者をロール付きで登録
    ///
    /// # Errors
    ///
    /// パーティが存在しない場合は `RepositoryError::PartyNotFound`
    pub async fn insert_member(
        &self,
        party_id: &PartyId,
        participant_id: ParticipantId,
        role: Role,
    ) -> Result<(), RepositoryError> {
        let mut parties = self.parties.lock().await;
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| RepositoryError::PartyNotFound(party_id.to_string()))?;
        match party.members.iter_mut().find(|(id, _)| id == &participant_id) {
            Some(member) => member.1 = role,
            None => party.members.push((participant_id, role)),
        }
        Ok(())
    }

    /// 保存済みのパーティ数
    pub async fn count_parties(&self) -> usize {
        self.parties.lock().await.len()
    }
}

#[async_trait]
impl PartyRepository for InMemoryPartyRepository {
    async fn find_party(&self, party_id: &PartyId) -> Result<Option<PartyRecord>, RepositoryError> {
        let mut parties = self.parties.lock().await;
        if let Some(party) = parties.get(party_id) {
            return Ok(Some(party.record.clone()));
        }
        if !self.auto_provision {
            return Ok(None);
        }

        tracing::info!("Provisioning party '{}'", party_id);
        let record = PartyRecord::new(party_id.clone());
        parties.insert(party_id.clone(), StoredParty::new(record.clone()));
        Ok(Some(record))
    }

    async fn find_member_role(
        &self,
        party_id: &PartyId,
        participant_id: &ParticipantId,
    ) -> Result<Option<Role>, RepositoryError> {
        let mut parties = self.parties.lock().await;
        let Some(party) = parties.get_mut(party_id) else {
            return Ok(None);
        };
        if let Some((_, role)) = party.members.iter().find(|(id, _)| id == participant_id) {
            return Ok(Some(*role));
        }
        if !self.auto_provision {
            return Ok(None);
        }

        let role = if party.members.is_empty() {
            Role::Host
        } else {
            Role::Viewer
        };
        tracing::info!(
            "Provisioning '{}' as {} of party '{}'",
            participant_id,
            role,
            party_id
        );
        party.members.push((participant_id.clone(), role));
        Ok(Some(role))
    }

    async fn save_playback(
        &self,
        party_id: &PartyId,
        playback: PlaybackState,
    ) -> Result<(), RepositoryError> {
        let mut parties = self.parties.lock().await;
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| RepositoryError::PartyNotFound(party_id.to_string()))?;
        party.record.playback = Some(playback);
        Ok(())
    }

    async fn mark_ended(&self, party_id: &PartyId) -> Result<(), RepositoryError> {
        let mut parties = self.parties.lock().await;
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| RepositoryError::PartyNotFound(party_id.to_string()))?;
        party.record.ended = true;
        Ok(())
    }
}
