//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{
    domain::{ErrorCode, RepositoryError},
    hub::HubError,
};

/// ユースケース実行時のエラー
///
/// クライアントへは `code()` の値を持つ `error` イベントとして通知されます。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    /// コマンドの解釈に失敗（接続は維持）
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    /// 参加者としてパーティに登録されていない
    #[error("'{0}' is not a participant of this party")]
    NotParticipant(String),

    #[error("Party not found: {0}")]
    PartyNotFound(String),

    #[error("Party has ended")]
    PartyEnded,

    #[error("Party is full: maximum {capacity} participants allowed")]
    PartyFull { capacity: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UseCaseError {
    /// 通知用のエラーコード
    pub fn code(&self) -> ErrorCode {
        match self {
            UseCaseError::MalformedCommand(_) => ErrorCode::InvalidCommand,
            UseCaseError::NotParticipant(_) => ErrorCode::Forbidden,
            UseCaseError::PartyNotFound(_) => ErrorCode::PartyNotFound,
            UseCaseError::PartyEnded => ErrorCode::PartyEnded,
            UseCaseError::PartyFull { .. } => ErrorCode::PartyFull,
            UseCaseError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// 接続を閉じるべきエラーか
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            UseCaseError::MalformedCommand(_) | UseCaseError::Internal(_)
        )
    }
}

impl From<HubError> for UseCaseError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::PartyNotFound(id) => UseCaseError::PartyNotFound(id),
            HubError::PartyEnded => UseCaseError::PartyEnded,
            HubError::PartyFull { capacity } => UseCaseError::PartyFull { capacity },
            HubError::Repository(msg) | HubError::Internal(msg) => UseCaseError::Internal(msg),
        }
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(err: RepositoryError) -> Self {
        HubError::from(err).into()
    }
}
