//! UseCase: 再生コマンド処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - IssueCommandUseCase::decode() によるコマンドの解釈と検証
//! - IssueCommandUseCase::execute() によるハブへの適用
//!
//! ### なぜこのテストが必要か
//! - 不正なフレームは接続を切らずに INVALID_COMMAND として扱う必要がある
//! - 解釈に成功したコマンドだけがハブ（単一の書き手）に渡ることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：各コマンドの解釈と適用
//! - 異常系：JSON 不正、必須フィールド欠落、別パーティ宛て、負の位置

use std::sync::Arc;

use crate::{
    domain::{ClipId, Command, Event, ParticipantId, Position},
    hub::PartyHub,
    infrastructure::dto::websocket::{CommandEnvelope, CommandType},
};

use super::error::UseCaseError;

/// 再生コマンドのユースケース
pub struct IssueCommandUseCase {
    hub: Arc<PartyHub>,
}

impl IssueCommandUseCase {
    /// 新しい IssueCommandUseCase を作成
    pub fn new(hub: Arc<PartyHub>) -> Self {
        Self { hub }
    }

    /// テキストフレームをコマンドとして解釈
    ///
    /// # Errors
    ///
    /// 解釈・検証に失敗した場合は `UseCaseError::MalformedCommand`
    pub fn decode(&self, text: &str) -> Result<Command, UseCaseError> {
        let envelope: CommandEnvelope = serde_json::from_str(text)
            .map_err(|e| UseCaseError::MalformedCommand(e.to_string()))?;

        if envelope.party_id != self.hub.party_id().as_str() {
            return Err(UseCaseError::MalformedCommand(format!(
                "command addressed to party '{}'",
                envelope.party_id
            )));
        }

        let command = match envelope.r#type {
            CommandType::Play => Command::Play,
            CommandType::Pause => Command::Pause,
            CommandType::SyncRequest => Command::SyncRequest,
            CommandType::Seek => {
                let seconds = envelope.position.ok_or_else(|| {
                    UseCaseError::MalformedCommand("seek requires a position".to_string())
                })?;
                let position = Position::new(seconds)
                    .map_err(|e| UseCaseError::MalformedCommand(e.to_string()))?;
                Command::Seek(position)
            }
            CommandType::Skip => {
                let clip_id = envelope.clip_id.ok_or_else(|| {
                    UseCaseError::MalformedCommand("skip requires a clip_id".to_string())
                })?;
                let clip_id = ClipId::new(clip_id)
                    .map_err(|e| UseCaseError::MalformedCommand(e.to_string()))?;
                Command::Skip(clip_id)
            }
        };
        Ok(command)
    }

    /// コマンドを解釈してハブに適用
    ///
    /// # Returns
    ///
    /// * `Ok(events)` - 発行されたイベント（権限のないコマンドは空）
    /// * `Err(UseCaseError)` - 解釈失敗、またはハブの失敗
    pub async fn execute(
        &self,
        participant_id: &ParticipantId,
        text: &str,
    ) -> Result<Vec<Event>, UseCaseError> {
        let command = self.decode(text)?;
        let events = self.hub.handle_command(participant_id, command).await?;
        Ok(events)
    }
}
